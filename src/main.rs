use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use fire_risk_map::api::{ApiClient, DEFAULT_API_BASE};
use fire_risk_map::app::{App, AppConfig, Focus};
use fire_risk_map::data;
use fire_risk_map::gamification::MissionKind;
use fire_risk_map::map::{fetch_or_sample, MapOptions};
use fire_risk_map::model::LatLng;
use fire_risk_map::settings::SettingsStore;
use fire_risk_map::ui;
use fire_risk_map::worker::{Offline, Worker};
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Forwards formatted log lines to the UI's log pane
#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal wildfire risk dashboard", long_about = None)]
struct Cli {
    /// Base URL of the risk API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,
    /// Directory holding Natural Earth GeoJSON files for the base map
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Settings file for the demo-mode preference
    #[arg(long, default_value = "fire-risk-map.json")]
    settings: PathBuf,
    #[arg(long, default_value_t = 37.7749, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, default_value_t = -122.4194, allow_negative_numbers = true)]
    lng: f64,
    #[arg(long, default_value_t = 6.0)]
    zoom: f64,
    /// Hide risk zones scoring below this value
    #[arg(long, default_value_t = 0.3)]
    risk_threshold: f64,
    #[arg(long)]
    hide_fires: bool,
    #[arg(long)]
    hide_risk_zones: bool,
    #[arg(long)]
    hide_resources: bool,
    /// Never touch the network; use the built-in sample data
    #[arg(long)]
    offline: bool,
    /// Seed for the simulated field events
    #[arg(long)]
    seed: Option<u64>,
    /// Write the current dataset as GeoJSON and exit
    #[arg(long, value_name = "PATH")]
    export_geojson: Option<PathBuf>,
    /// Send an image to the fire detector at start-up
    #[arg(long, value_name = "IMAGE")]
    detect_image: Option<PathBuf>,
}

impl Cli {
    fn map_options(&self) -> MapOptions {
        MapOptions {
            center: LatLng::new(self.lat, self.lng),
            zoom: self.zoom,
            show_fires: !self.hide_fires,
            show_risk_zones: !self.hide_risk_zones,
            show_resources: !self.hide_resources,
            risk_threshold: self.risk_threshold,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.export_geojson {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
        return export(&cli, path);
    }

    // The terminal is in raw mode, so logs go to the log pane
    let (log_tx, log_rx) = mpsc::channel::<String>();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .compact()
        .with_ansi(false)
        .with_writer(move || ChannelWriter {
            sender: log_tx.clone(),
        })
        .init();

    let worker = if cli.offline {
        Worker::spawn(Offline)
    } else {
        Worker::spawn(ApiClient::new(cli.api_base.clone()))
    };

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = start(&mut terminal, &cli, worker, log_rx);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn export(cli: &Cli, path: &std::path::Path) -> Result<()> {
    let (dataset, outcome) = if cli.offline {
        fetch_or_sample(&Offline)
    } else {
        fetch_or_sample(&ApiClient::new(cli.api_base.clone()))
    };
    let count = data::export_geojson(&dataset, path)?;
    println!("Wrote {count} features ({outcome:?} data) to {}", path.display());
    Ok(())
}

fn start(terminal: &mut DefaultTerminal, cli: &Cli, worker: Worker, logs: Receiver<String>) -> Result<()> {
    let size = terminal.size()?;
    let config = AppConfig {
        map: cli.map_options(),
        seed: cli.seed,
        settings: SettingsStore::new(cli.settings.clone()),
        detect_image: cli.detect_image.clone(),
    };
    let mut app = App::new(config, worker, size.width, size.height);

    if cli.data_dir.exists() {
        data::load_all_geojson(&mut app.map_renderer, &cli.data_dir)?;
    }
    if !app.map_renderer.has_data() {
        info!("no base map data found in {}; using built-in outline", cli.data_dir.display());
        data::generate_fallback_outline(&mut app.map_renderer);
    }

    app.request_load();
    run(terminal, &mut app, &logs)
}

/// Handle mouse events for panning, zooming and selection
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => {
            app.mouse_up(mouse.column, mouse.row);
        }
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Row navigation while the table has focus
    if app.focus == Focus::Table {
        match key.code {
            KeyCode::Up => return app.select_prev_row(),
            KeyCode::Down => return app.select_next_row(),
            KeyCode::Enter => {
                app.view_selected_row();
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -8),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 8),

        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Overlay layers
        KeyCode::Char('f') => app.toggle_fires(),
        KeyCode::Char('z') => app.toggle_risk_zones(),
        KeyCode::Char('x') => app.toggle_resources(),
        KeyCode::Char('[') => app.adjust_threshold(-1),
        KeyCode::Char(']') => app.adjust_threshold(1),
        KeyCode::Char('{') => app.adjust_chart_threshold(-1),
        KeyCode::Char('}') => app.adjust_chart_threshold(1),

        KeyCode::Char('r') => app.refresh_map(),
        KeyCode::Char('R') => app.refresh_risk_data(),
        KeyCode::Char('d') => app.deploy_resources(),
        KeyCode::Char('a') => app.view_alert(),
        KeyCode::Char('o') => app.request_optimization(),
        KeyCode::Char('p') => app.request_prediction(),
        KeyCode::Char('m') => app.toggle_demo_mode(),
        KeyCode::Char('1') => app.work_on_mission(MissionKind::Detection),
        KeyCode::Char('2') => app.work_on_mission(MissionKind::Optimization),
        KeyCode::Char('3') => app.work_on_mission(MissionKind::Alerts),

        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Char('L') => app.toggle_logs(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App, logs: &Receiver<String>) -> Result<()> {
    loop {
        while let Ok(text) = logs.try_recv() {
            app.push_log(&text);
        }
        app.tick(Instant::now());

        terminal.draw(|frame| ui::render(frame, app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
