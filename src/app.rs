use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::api::Weather;
use crate::chart::RiskChart;
use crate::dashboard::Dashboard;
use crate::feed::{Activity, ActivityKind};
use crate::gamification::{MissionKind, Tracker};
use crate::map::{FireRiskMap, LoadOutcome, Lod, MapOptions, MapRenderer, Selected};
use crate::panels::{DashboardHooks, Details};
use crate::model::RiskArea;
use crate::risk::{RiskLevel, Subject};
use crate::settings::{Settings, SettingsStore};
use crate::toast::ToastKind;
use crate::ui;
use crate::worker::{default_available_resources, Job, JobResult, Worker};

/// Lines kept in the log pane
pub const LOG_LINES: usize = 8;
/// Zoom used by the table's "view on map" action
pub const VIEW_ZOOM: f64 = 8.0;
const THRESHOLD_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Map,
    Table,
}

/// Start-up configuration gathered from the command line
pub struct AppConfig {
    pub map: MapOptions,
    pub seed: Option<u64>,
    pub settings: SettingsStore,
    pub detect_image: Option<PathBuf>,
}

/// Application state
pub struct App {
    pub map: FireRiskMap<DashboardHooks>,
    pub map_renderer: MapRenderer,
    pub dashboard: Dashboard,
    pub chart: RiskChart,
    pub settings: Settings,
    settings_store: SettingsStore,
    worker: Worker,
    pub focus: Focus,
    pub table_row: usize,
    pub logs: VecDeque<String>,
    pub show_logs: bool,
    pub loading: bool,
    pub source: Option<LoadOutcome>,
    pub should_quit: bool,
    /// Inner map rectangle in terminal cells
    pub map_area: Rect,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    dragged: bool,
    /// Current mouse position for cursor marker and tooltip
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    pub fn new(config: AppConfig, worker: Worker, width: u16, height: u16) -> Self {
        let settings = config.settings.load();
        let mut app = Self {
            map: FireRiskMap::with_observer(config.map, DashboardHooks::default()),
            map_renderer: MapRenderer::new(),
            dashboard: Dashboard::new(Tracker::demo(), config.seed),
            chart: RiskChart::default(),
            settings,
            settings_store: config.settings,
            worker,
            focus: Focus::Map,
            table_row: 0,
            logs: VecDeque::with_capacity(LOG_LINES),
            show_logs: false,
            loading: false,
            source: None,
            should_quit: false,
            map_area: Rect::default(),
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
        };
        app.resize(width, height);
        if let Some(path) = config.detect_image {
            app.worker.submit(Job::Detect(path));
        }
        app
    }

    /// Update the map viewport when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        let panes = ui::layout(Rect::new(0, 0, width, height));
        self.map_area = panes.map_inner;
        // Braille gives 2x4 resolution per character
        let viewport = self.map.viewport_mut();
        viewport.width = panes.map_inner.width as usize * 2;
        viewport.height = panes.map_inner.height as usize * 4;
    }

    /// Start a background load; the result arrives through `poll_jobs`
    pub fn request_load(&mut self) {
        self.loading = self.worker.submit(Job::Load);
    }

    /// Drain every finished background job
    pub fn poll_jobs(&mut self) {
        while let Some(result) = self.worker.try_recv() {
            self.handle_result(result);
        }
    }

    pub fn handle_result(&mut self, result: JobResult) {
        match result {
            JobResult::Loaded(data, outcome) => {
                let fires = data.active_fires.len();
                let resources = data.resources.len();
                self.map.replace_data(data);
                self.dashboard.sync_counts(fires, resources);
                self.dashboard.mark_updated();
                self.loading = false;
                self.source = Some(outcome);
                self.table_row = self.table_row.min(self.map.observer().rows.len().saturating_sub(1));
                info!(?outcome, fires, resources, "map data installed");
                self.dashboard.toasts.push(
                    "Map Refreshed",
                    "Fire risk map has been refreshed with the latest data.",
                    ToastKind::Info,
                );
            }
            JobResult::Predicted { area_id, prediction } => {
                let name = self
                    .map
                    .data()
                    .area(area_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| format!("Area {area_id}"));
                let level = RiskLevel::from_score(prediction.risk_score);
                self.dashboard.feed.push(Activity::new(
                    ActivityKind::Risk,
                    "Risk Prediction",
                    format!(
                        "{name}: predicted risk {:.2} ({}).",
                        prediction.risk_score,
                        level.label()
                    ),
                ));
                self.dashboard.toasts.push(
                    "Prediction Ready",
                    format!("{name} is at {} risk.", level.label()),
                    ToastKind::Info,
                );
            }
            JobResult::Optimized(plan) => {
                let areas = plan.recommendations.len();
                self.dashboard.feed.push(Activity::new(
                    ActivityKind::Resource,
                    "Resource Plan Ready",
                    format!("Allocation recommendations received for {areas} areas."),
                ));
                self.dashboard.advance(MissionKind::Optimization);
            }
            JobResult::Detected(report) => {
                let detection = report.detections;
                if detection.has_fire {
                    self.dashboard.feed.push(Activity::new(
                        ActivityKind::Fire,
                        "Fire Detected in Image",
                        format!(
                            "{} fire regions found with {:.0}% confidence.",
                            detection.regions.len(),
                            detection.confidence * 100.0
                        ),
                    ));
                    self.dashboard.advance(MissionKind::Detection);
                } else {
                    self.dashboard.toasts.push(
                        "No Fire Detected",
                        format!("Image analysed with {:.0}% confidence.", detection.confidence * 100.0),
                        ToastKind::Secondary,
                    );
                }
            }
            JobResult::Failed { job, error } => {
                if job == "load" {
                    self.loading = false;
                }
                self.dashboard.toasts.push("Request Failed", format!("{job}: {error}"), ToastKind::Danger);
            }
        }
    }

    /// Per-frame housekeeping
    pub fn tick(&mut self, now: Instant) {
        self.poll_jobs();
        self.dashboard.toasts.prune(now);
    }

    /// Append captured log output, keeping only the newest lines
    pub fn push_log(&mut self, text: &str) {
        for line in text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            if self.logs.len() == LOG_LINES {
                self.logs.pop_front();
            }
            self.logs.push_back(line.to_string());
        }
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map.viewport_mut().pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.map.viewport_mut().zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.map.viewport_mut().zoom_out();
    }

    /// Terminal cell to braille pixel inside the map, if the cell is on the map
    pub fn cell_to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        let inside = col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height;
        inside.then(|| (((col - area.x) as i32) * 2, ((row - area.y) as i32) * 4))
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.map.viewport_mut().zoom_in_at(px, py);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.map.viewport_mut().zoom_out_at(px, py);
        }
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Drag to pan; one cell is 2x4 braille pixels
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - col as i32) * 2;
            let dy = (last_y as i32 - row as i32) * 4;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Mouse release: a click without drag selects what is under the cursor
    pub fn mouse_up(&mut self, col: u16, row: u16) -> Option<Selected> {
        let clicked = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if !clicked {
            return None;
        }
        let (px, py) = self.cell_to_pixel(col, row)?;
        self.map.select_at(px, py)
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Tooltip for whatever the mouse is hovering
    pub fn hover_tooltip(&self) -> Option<&str> {
        let (col, row) = self.mouse_pos?;
        let (px, py) = self.cell_to_pixel(col, row)?;
        self.map.tooltip_at(px, py)
    }

    pub fn toggle_fires(&mut self) {
        let show = !self.map.view().show_fires;
        self.map.toggle_fires(show);
    }

    pub fn toggle_risk_zones(&mut self) {
        let show = !self.map.view().show_risk_zones;
        self.map.toggle_risk_zones(show);
    }

    pub fn toggle_resources(&mut self) {
        let show = !self.map.view().show_resources;
        self.map.toggle_resources(show);
    }

    /// Step the map's risk filter by one notch
    pub fn adjust_threshold(&mut self, steps: i32) {
        let next = round_tenth(self.map.view().risk_threshold + steps as f64 * THRESHOLD_STEP);
        self.map.set_risk_threshold(next);
    }

    pub fn adjust_chart_threshold(&mut self, steps: i32) {
        let next = round_tenth(self.chart.threshold + steps as f64 * THRESHOLD_STEP);
        self.chart.set_threshold(next);
    }

    pub fn refresh_map(&mut self) {
        info!("map refresh requested");
        self.request_load();
    }

    pub fn refresh_risk_data(&mut self) {
        self.dashboard.refresh_risk_data();
    }

    pub fn deploy_resources(&mut self) {
        self.dashboard.deploy_resources();
    }

    pub fn view_alert(&mut self) {
        if !self.dashboard.view_alert() {
            self.dashboard
                .toasts
                .push("No Alerts", "There are no fire alerts to review.", ToastKind::Secondary);
        }
    }

    /// Ask the backend for an allocation plan over the current areas
    pub fn request_optimization(&mut self) {
        let areas = self.map.data().risk_areas.clone();
        self.worker.submit(Job::Optimize {
            areas,
            available: default_available_resources(),
        });
    }

    /// The selected risk area, or the highlighted table row when nothing
    /// (or something other than an area) is selected
    fn prediction_target(&self) -> Option<&RiskArea> {
        let selected = match &self.map.observer().details {
            Some(Details::Risk { subject: Subject::Area, id, .. }) => self.map.data().area(*id),
            _ => None,
        };
        selected.or_else(|| {
            let row = self.map.observer().rows.get(self.table_row)?;
            self.map.data().area(row.id)
        })
    }

    /// Ask the backend for a fresh prediction for the selected area
    pub fn request_prediction(&mut self) {
        let Some(area) = self.prediction_target() else {
            self.dashboard
                .toasts
                .push("Nothing Selected", "Select a risk area first.", ToastKind::Secondary);
            return;
        };
        let job = Job::Predict {
            area_id: area.id,
            location: area.center,
            weather: Weather::default(),
        };
        self.worker.submit(job);
    }

    /// Flip the persisted demo-mode preference
    pub fn toggle_demo_mode(&mut self) {
        self.settings.demo_mode = !self.settings.demo_mode;
        if let Err(err) = self.settings_store.save(&self.settings) {
            warn!("failed to save settings: {err}");
        }
        info!(demo_mode = self.settings.demo_mode, "demo mode toggled");
    }

    /// Mission card action from the guardian pane
    pub fn work_on_mission(&mut self, kind: MissionKind) {
        self.dashboard.work_on_mission(kind);
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Map => Focus::Table,
            Focus::Table => Focus::Map,
        };
    }

    pub fn select_prev_row(&mut self) {
        self.table_row = self.table_row.saturating_sub(1);
    }

    pub fn select_next_row(&mut self) {
        let last = self.map.observer().rows.len().saturating_sub(1);
        self.table_row = (self.table_row + 1).min(last);
    }

    /// Table "view" action: center on the row's area and show its details
    pub fn view_selected_row(&mut self) -> bool {
        let Some(row) = self.map.observer().rows.get(self.table_row) else {
            return false;
        };
        let (id, center) = (row.id, row.center);
        self.map.center_on(center, VIEW_ZOOM);
        self.map.select_area(id)
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("z{:.0}", self.map.viewport().zoom)
    }

    pub fn center_coords(&self) -> String {
        let center = self.map.viewport().center();
        format!(
            "{:.2}°{}, {:.2}°{}",
            center.lat.abs(),
            if center.lat >= 0.0 { "N" } else { "S" },
            center.lng.abs(),
            if center.lng >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        match Lod::from_zoom(self.map.viewport().zoom) {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapObserver;
    use crate::worker::Offline;

    fn app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            map: MapOptions::default(),
            seed: Some(5),
            settings: SettingsStore::new(dir.path().join("settings.json")),
            detect_image: None,
        };
        let mut app = App::new(config, Worker::spawn(Offline), 160, 50);
        app.request_load();
        let result = app.worker.recv().unwrap();
        app.handle_result(result);
        (app, dir)
    }

    #[test]
    fn test_load_installs_fallback_and_counts() {
        let (app, _dir) = app();
        assert_eq!(app.source, Some(LoadOutcome::Fallback));
        assert!(!app.loading);
        assert_eq!(app.dashboard.counters.active_fires, 2);
        assert_eq!(app.dashboard.counters.deployed_resources, 2);
        assert_eq!(app.map.observer().rows.len(), 3);
        assert!(app.dashboard.toasts.iter().any(|t| t.title == "Map Refreshed"));
    }

    #[test]
    fn test_viewport_matches_map_pane() {
        let (app, _dir) = app();
        let vp = app.map.viewport();
        assert_eq!(vp.width, app.map_area.width as usize * 2);
        assert_eq!(vp.height, app.map_area.height as usize * 4);
        assert!(vp.width > 0 && vp.height > 0);
    }

    #[test]
    fn test_threshold_steps_are_clean_tenths() {
        let (mut app, _dir) = app();
        app.adjust_threshold(1);
        app.adjust_threshold(1);
        app.adjust_threshold(1);
        assert_eq!(app.map.view().risk_threshold, 0.6);
        assert_eq!(app.map.overlays().risk_zones.len(), 2);
        app.adjust_threshold(-10);
        assert_eq!(app.map.view().risk_threshold, 0.0);
    }

    #[test]
    fn test_view_row_centers_and_selects() {
        let (mut app, _dir) = app();
        app.select_next_row();
        assert!(app.view_selected_row());
        assert_eq!(app.map.viewport().zoom, VIEW_ZOOM);
        let details = app.map.observer().details.as_ref().unwrap();
        assert_eq!(details.name(), "Eastern Woodland");
    }

    #[test]
    fn test_click_without_drag_selects_center_resource() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            map: MapOptions {
                center: crate::model::LatLng::new(37.75, -122.45),
                zoom: 9.0,
                ..MapOptions::default()
            },
            seed: Some(5),
            settings: SettingsStore::new(dir.path().join("settings.json")),
            detect_image: None,
        };
        let mut app = App::new(config, Worker::spawn(Offline), 160, 50);
        app.request_load();
        let result = app.worker.recv().unwrap();
        app.handle_result(result);

        let area = app.map_area;
        let (col, row) = (area.x + area.width / 2, area.y + area.height / 2);
        app.mouse_down(col, row);
        assert_eq!(app.mouse_up(col, row), Some(Selected::Resource(201)));

        app.mouse_down(col, row);
        app.handle_drag(col + 3, row);
        assert_eq!(app.mouse_up(col + 3, row), None);
    }

    #[test]
    fn test_prediction_ignores_selected_fire_sharing_an_area_id() {
        let (mut app, _dir) = app();
        let mut data = crate::model::Dataset::sample();
        data.active_fires[0].id = 3;
        app.map.replace_data(data);

        let fire = app.map.data().active_fires[0].clone();
        app.map.observer_mut().fire_selected(&fire);
        // Falls back to the top table row, not the area that shares the fire's id
        assert_eq!(app.prediction_target().map(|a| a.id), Some(1));

        assert!(app.map.select_area(2));
        assert_eq!(app.prediction_target().map(|a| a.id), Some(2));
    }

    #[test]
    fn test_demo_mode_persists() {
        let (mut app, dir) = app();
        app.toggle_demo_mode();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert!(store.load().demo_mode);
    }

    #[test]
    fn test_log_pane_keeps_newest_lines() {
        let (mut app, _dir) = app();
        for i in 0..12 {
            app.push_log(&format!("line {i}\n"));
        }
        assert_eq!(app.logs.len(), LOG_LINES);
        assert_eq!(app.logs.front().map(String::as_str), Some("line 4"));
    }

    #[test]
    fn test_offline_optimization_reports_failure() {
        let (mut app, _dir) = app();
        app.request_optimization();
        let result = app.worker.recv().unwrap();
        app.handle_result(result);
        assert!(app.dashboard.toasts.iter().any(|t| t.title == "Request Failed"));
    }
}
