use crate::app::{App, Focus};
use crate::braille::BrailleCanvas;
use crate::feed::ActivityKind;
use crate::gamification::{Achievement, MissionKind};
use crate::map::{LoadOutcome, MapLayers};
use crate::panels::Details;
use crate::risk::RiskLevel;
use crate::toast::ToastKind;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, LineGauge, List, ListItem, Paragraph, Row, Table,
        TableState, Widget, Wrap,
    },
    Frame,
};

const TOAST_WIDTH: u16 = 44;
const DIM: Style = Style::new().fg(Color::DarkGray);

/// Screen regions of the dashboard
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Panes {
    pub map: Rect,
    pub map_inner: Rect,
    pub table: Rect,
    pub chart: Rect,
    pub details: Rect,
    pub guardian: Rect,
    pub feed: Rect,
    pub status: Rect,
}

/// Split the terminal into panes. Shared with the app so mouse
/// coordinates and the viewport size agree with what is drawn.
pub fn layout(area: Rect) -> Panes {
    let [body, status] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
    let [left, side] = Layout::horizontal([Constraint::Min(40), Constraint::Length(46)]).areas(body);
    let [map, bottom] = Layout::vertical([Constraint::Min(8), Constraint::Length(10)]).areas(left);
    let [table, chart] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(bottom);
    let [details, guardian, feed] = Layout::vertical([
        Constraint::Length(14),
        Constraint::Length(8),
        Constraint::Min(5),
    ])
    .areas(side);

    Panes {
        map,
        map_inner: Block::default().borders(Borders::ALL).inner(map),
        table,
        chart,
        details,
        guardian,
        feed,
        status,
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let panes = layout(frame.area());

    render_map(frame, app, &panes);
    render_table(frame, app, panes.table);
    if app.show_logs {
        render_logs(frame, app, panes.chart);
    } else {
        render_chart(frame, app, panes.chart);
    }
    render_details(frame, app, panes.details);
    render_guardian(frame, app, panes.guardian);
    render_feed(frame, app, panes.feed);
    render_status_bar(frame, app, panes.status);
    render_toasts(frame, app, panes.map_inner);
}

fn level_style(level: RiskLevel) -> Style {
    Style::default().fg(level.color().into())
}

fn render_map(frame: &mut Frame, app: &App, panes: &Panes) {
    let mut title = vec![Span::styled(
        " Fire Risk Map ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if app.loading {
        title.push(Span::styled("loading… ", Style::default().fg(Color::Yellow)));
    } else if app.source == Some(LoadOutcome::Fallback) {
        title.push(Span::styled("sample data ", Style::default().fg(Color::Yellow)));
    }
    if app.settings.demo_mode {
        title.push(Span::styled(
            " DEMO ",
            Style::default().fg(Color::Black).bg(Color::Magenta),
        ));
    }

    let legend: Vec<Span> = RiskLevel::ALL
        .iter()
        .flat_map(|&level| {
            [
                Span::styled(" ■ ", level_style(level)),
                Span::styled(level.label(), DIM),
            ]
        })
        .chain([Span::raw(" ")])
        .collect();

    let border = if app.focus == Focus::Map { Color::Gray } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Line::from(title))
        .title_bottom(Line::from(legend));
    let inner = panes.map_inner;
    frame.render_widget(block, panes.map);

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        app.map.viewport(),
        app.map.overlays(),
    );

    let cursor_pos = app
        .mouse_pos
        .and_then(|(col, row)| app.cell_to_pixel(col, row))
        .map(|(px, py)| ((px / 2) as u16, (py / 4) as u16));

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Braille layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, area: Rect, buf: &mut Buffer) {
        let rows = canvas.height().min(area.height as usize);
        let cols = canvas.width().min(area.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                if let Some((ch, color)) = canvas.cell(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.layers.base, area, buf);
        Self::render_layer(&self.layers.zones, area, buf);
        Self::render_layer(&self.layers.fires, area, buf);

        for label in &self.layers.labels {
            if label.y >= area.height || label.x >= area.width {
                continue;
            }
            let max_len = (area.width - label.x) as usize;
            for (i, ch) in label.text.chars().take(max_len).enumerate() {
                buf[(area.x + label.x + i as u16, area.y + label.y)]
                    .set_char(ch)
                    .set_style(Style::default().fg(label.color).add_modifier(Modifier::BOLD));
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            if cx < area.width && cy < area.height {
                buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::White);
            }
        }
    }
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(["Region", "Risk", "Score", "Factors"]).style(DIM.add_modifier(Modifier::BOLD));
    let rows = app.map.observer().rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.name.clone()),
            Cell::from(row.level.label()).style(level_style(row.level)),
            Cell::from(format!("{:.2}", row.score)),
            Cell::from(row.factors.clone()),
        ])
    });

    let focused = app.focus == Focus::Table;
    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol("▶ ")
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { Color::Gray } else { Color::DarkGray }))
            .title(" High Risk Regions ")
            .title_bottom(Line::from(Span::styled(" Tab focus · Enter view on map ", DIM))),
    );

    let mut state = TableState::default().with_selected(focused.then_some(app.table_row));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let bars: Vec<Bar> = app
        .chart
        .visible()
        .map(|bar| {
            let color: Color = bar.color().into();
            Bar::default()
                .value((bar.value * 100.0).round() as u64)
                .label(Line::from(bar.label))
                .text_value(format!("{:.0}%", bar.value * 100.0))
                .style(Style::default().fg(color))
        })
        .collect();

    let level = app.chart.threshold_level();
    let title = Line::from(vec![
        Span::raw(" Regional Risk "),
        Span::styled(format!("≥ {:.1} ", app.chart.threshold), level_style(level)),
    ]);
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(1)
        .max(100);
    frame.render_widget(chart, area);
}

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app.logs.iter().map(|l| Line::from(Span::styled(l.as_str(), DIM))).collect();
    let logs = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Logs "))
        .wrap(Wrap { trim: true });
    frame.render_widget(logs, area);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");
    let lines = match &app.map.observer().details {
        None => vec![Line::from(Span::styled(
            "Click a risk zone, fire or resource on the map.",
            DIM,
        ))],
        Some(Details::Risk {
            name,
            score,
            level,
            factors,
            recommendations,
            alert_action,
            ..
        }) => {
            let mut lines = vec![
                Line::from(Span::styled(name.as_str(), Style::default().add_modifier(Modifier::BOLD))),
                Line::from(vec![
                    Span::raw("Risk: "),
                    Span::styled(format!(" {} ", level.label()), level_style(*level).add_modifier(Modifier::REVERSED)),
                    Span::raw(format!(" {score:.2}")),
                ]),
                Line::from(Span::styled("Factors", DIM)),
            ];
            lines.extend(factors.iter().map(|f| Line::from(format!(" • {f}"))));
            lines.push(Line::from(Span::styled("Recommendations", DIM)));
            lines.extend(recommendations.iter().map(|r| Line::from(format!(" • {r}"))));
            lines.push(Line::from(Span::styled(
                format!("[{alert_action}]"),
                Style::default().fg(Color::Red),
            )));
            lines
        }
        Some(Details::Resource {
            name,
            kind,
            personnel,
            location,
            ..
        }) => vec![
            Line::from(Span::styled(name.as_str(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(format!("Type: {kind}")),
            Line::from(format!("Personnel: {personnel}")),
            Line::from(format!("Location: {:.4}, {:.4}", location.lat, location.lng)),
        ],
    };
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_guardian(frame: &mut Frame, app: &App, area: Rect) {
    let tracker = &app.dashboard.tracker;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} · {} pts ", tracker.level(), tracker.points()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Length(1); 6]).split(inner);
    for (kind, row) in MissionKind::ALL.iter().zip(rows.iter()) {
        let progress = tracker.progress(*kind);
        let color = if tracker.is_complete(*kind) { Color::Green } else { Color::Yellow };
        let gauge = LineGauge::default()
            .ratio(progress as f64 / kind.cap() as f64)
            .label(format!("{:<18} {progress}/{}", kind.title(), kind.cap()))
            .filled_style(Style::default().fg(color))
            .unfilled_style(DIM);
        frame.render_widget(gauge, *row);
    }

    let badges: Vec<Span> = Achievement::ALL
        .iter()
        .map(|&a| {
            if tracker.is_unlocked(a) {
                Span::styled(format!("★ {} ", a.title()), Style::default().fg(Color::Yellow))
            } else {
                Span::styled(format!("☆ {} ", a.title()), DIM)
            }
        })
        .collect();
    if let Some(row) = rows.get(3) {
        frame.render_widget(Paragraph::new(Line::from(badges)), *row);
    }

    let counters = app.dashboard.counters;
    let updated = app
        .dashboard
        .last_updated
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    if let Some(row) = rows.get(4) {
        let line = Line::from(vec![
            Span::styled(format!("🔥 {} active ", counters.active_fires), Style::default().fg(Color::Red)),
            Span::styled(format!("👥 {} deployed ", counters.deployed_resources), Style::default().fg(Color::Blue)),
            Span::styled(format!("updated {updated}"), DIM),
        ]);
        frame.render_widget(Paragraph::new(line), *row);
    }
}

fn activity_color(kind: ActivityKind) -> Color {
    match kind {
        ActivityKind::Fire => Color::Red,
        ActivityKind::Resource => Color::Blue,
        ActivityKind::Risk => Color::Yellow,
        ActivityKind::Weather => Color::Cyan,
        ActivityKind::Info => Color::Gray,
    }
}

fn render_feed(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .dashboard
        .feed
        .iter()
        .map(|a| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!("{} ", a.kind.icon()), Style::default().fg(activity_color(a.kind))),
                    Span::styled(a.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", a.timestamp.format("%H:%M")), DIM),
                ]),
                Line::from(Span::styled(format!("  {}", a.description), DIM)),
            ])
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Recent Activity "));
    frame.render_widget(list, area);
}

fn toast_color(kind: ToastKind) -> Color {
    match kind {
        ToastKind::Success => Color::Green,
        ToastKind::Info => Color::Cyan,
        ToastKind::Primary => Color::Blue,
        ToastKind::Danger => Color::Red,
        ToastKind::Secondary => Color::Gray,
    }
}

/// Stack toasts in the top-right corner of the map
fn render_toasts(frame: &mut Frame, app: &App, map: Rect) {
    let width = TOAST_WIDTH.min(map.width);
    let mut y = map.y;
    for toast in app.dashboard.toasts.iter() {
        if y + 4 > map.y + map.height {
            break;
        }
        let rect = Rect::new(map.x + map.width - width, y, width, 4);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(toast_color(toast.kind)))
            .title(Span::styled(
                format!(" {} ", toast.title),
                Style::default().fg(toast_color(toast.kind)).add_modifier(Modifier::BOLD),
            ));
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(toast.message.as_str()).block(block).wrap(Wrap { trim: true }),
            rect,
        );
        y += 4;
    }
}

fn toggle_span(label: &'static str, on: bool) -> Span<'static> {
    Span::styled(label, Style::default().fg(if on { Color::Green } else { Color::DarkGray }))
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.map.view();

    let mut spans = vec![
        Span::styled(" Zoom: ", DIM),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", DIM),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", DIM),
        toggle_span("[f]ires ", view.show_fires),
        toggle_span("[z]ones ", view.show_risk_zones),
        toggle_span("[x]res ", view.show_resources),
        Span::styled(
            format!("≥{:.1} ", view.risk_threshold),
            level_style(RiskLevel::from_score(view.risk_threshold)),
        ),
        Span::styled("| ", DIM),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];
    match app.hover_tooltip() {
        Some(tip) => spans.push(Span::styled(format!(" | {tip}"), Style::default().fg(Color::White))),
        None => spans.push(Span::styled(
            " | R:refresh d:deploy a:alert o:optimize p:predict m:demo L:logs q:quit",
            DIM,
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
