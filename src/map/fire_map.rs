use glam::DVec2;
use tracing::{debug, info, warn};

use crate::api::DataSource;
use crate::map::overlay::{Overlays, ViewState};
use crate::map::projection::Viewport;
use crate::model::{ActiveFire, Dataset, LatLng, Resource, RiskArea};

/// Pixel distance within which a click hits a fire or resource marker
const MARKER_HIT_PX: f64 = 3.0;

/// Hooks fired by the map. Every hook defaults to a no-op.
pub trait MapObserver {
    fn area_selected(&mut self, _area: &RiskArea) {}
    fn fire_selected(&mut self, _fire: &ActiveFire) {}
    fn resource_selected(&mut self, _resource: &Resource) {}
    /// Called after every render with the snapshot that was rendered
    fn map_updated(&mut self, _data: &Dataset) {}
}

/// Observer that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl MapObserver for NoopObserver {}

/// Initial map configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    pub show_fires: bool,
    pub show_risk_zones: bool,
    pub show_resources: bool,
    pub risk_threshold: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: LatLng::new(37.7749, -122.4194),
            zoom: 6.0,
            show_fires: true,
            show_risk_zones: true,
            show_resources: true,
            risk_threshold: 0.3,
        }
    }
}

/// Where the current snapshot came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Live,
    Fallback,
}

/// Item hit by a selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selected {
    Area(u64),
    Fire(u64),
    Resource(u64),
}

/// Fetch a snapshot, substituting the built-in sample on any failure
pub fn fetch_or_sample(source: &dyn DataSource) -> (Dataset, LoadOutcome) {
    match source.fetch() {
        Ok(data) => (data, LoadOutcome::Live),
        Err(err) => {
            warn!("Error loading data: {err}; using built-in sample data");
            (Dataset::sample(), LoadOutcome::Fallback)
        }
    }
}

/// The risk map: data snapshot, view state, overlays and the viewport
pub struct FireRiskMap<O: MapObserver = NoopObserver> {
    viewport: Viewport,
    view: ViewState,
    data: Dataset,
    overlays: Overlays,
    observer: O,
}

impl FireRiskMap<NoopObserver> {
    pub fn new(options: MapOptions) -> Self {
        Self::with_observer(options, NoopObserver)
    }
}

impl<O: MapObserver> FireRiskMap<O> {
    pub fn with_observer(options: MapOptions, observer: O) -> Self {
        Self {
            viewport: Viewport::centered(options.center, options.zoom, 0, 0),
            view: ViewState {
                show_fires: options.show_fires,
                show_risk_zones: options.show_risk_zones,
                show_resources: options.show_resources,
                risk_threshold: options.risk_threshold.clamp(0.0, 1.0),
            },
            data: Dataset::default(),
            overlays: Overlays::default(),
            observer,
        }
    }

    pub fn set_observer(&mut self, observer: O) {
        self.observer = observer;
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    /// Load from the source (or the sample on failure) and render
    pub fn load(&mut self, source: &dyn DataSource) -> LoadOutcome {
        let (data, outcome) = fetch_or_sample(source);
        self.replace_data(data);
        outcome
    }

    /// Re-run the load
    pub fn refresh(&mut self, source: &dyn DataSource) -> LoadOutcome {
        info!("refreshing map data");
        self.load(source)
    }

    /// Install a complete snapshot and render it
    pub fn replace_data(&mut self, data: Dataset) {
        self.data = data;
        self.render();
    }

    /// Rebuild all overlay groups from the snapshot and view state
    pub fn render(&mut self) {
        self.overlays.rebuild(&self.data, &self.view);
        debug!(
            zones = self.overlays.risk_zones.len(),
            fires = self.overlays.fires.len(),
            resources = self.overlays.resources.len(),
            "map rendered"
        );
        self.observer.map_updated(&self.data);
    }

    pub fn set_risk_threshold(&mut self, threshold: f64) {
        self.view.risk_threshold = threshold.clamp(0.0, 1.0);
        self.render();
    }

    pub fn toggle_fires(&mut self, show: bool) {
        self.view.show_fires = show;
        self.render();
    }

    pub fn toggle_risk_zones(&mut self, show: bool) {
        self.view.show_risk_zones = show;
        self.render();
    }

    pub fn toggle_resources(&mut self, show: bool) {
        self.view.show_resources = show;
        self.render();
    }

    /// Move the viewport; data and overlays stay as they are
    pub fn center_on(&mut self, center: LatLng, zoom: f64) {
        self.viewport.center_on(center, zoom);
    }

    /// Find the top-most overlay item under a braille pixel
    pub fn hit_test(&self, px: i32, py: i32) -> Option<Selected> {
        let cursor = DVec2::new(px as f64, py as f64);
        let screen = |loc: LatLng| {
            let (x, y) = self.viewport.project(loc.lng, loc.lat);
            DVec2::new(x as f64, y as f64)
        };

        // Resources are drawn last, so they win
        let nearest_marker = |points: &mut dyn Iterator<Item = (u64, LatLng)>| {
            points
                .map(|(id, loc)| (id, screen(loc).distance(cursor)))
                .filter(|&(_, d)| d <= MARKER_HIT_PX)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        };

        if let Some(id) =
            nearest_marker(&mut self.overlays.resources.iter().map(|r| (r.resource_id, r.location)))
        {
            return Some(Selected::Resource(id));
        }
        if let Some(id) =
            nearest_marker(&mut self.overlays.fires.iter().map(|f| (f.fire_id, f.location)))
        {
            return Some(Selected::Fire(id));
        }

        // Zones overlap; the riskiest one is painted on top
        self.overlays
            .risk_zones
            .iter()
            .filter(|zone| {
                let radius = self
                    .viewport
                    .meters_to_pixels(zone.radius_m, zone.center.lat)
                    .max(1.0);
                screen(zone.center).distance(cursor) <= radius
            })
            .max_by(|a, b| a.risk_score.total_cmp(&b.risk_score))
            .map(|zone| Selected::Area(zone.area_id))
    }

    /// Tooltip text of the item under a braille pixel
    pub fn tooltip_at(&self, px: i32, py: i32) -> Option<&str> {
        match self.hit_test(px, py)? {
            Selected::Area(id) => self
                .overlays
                .risk_zones
                .iter()
                .find(|z| z.area_id == id)
                .map(|z| z.tooltip.as_str()),
            Selected::Fire(id) => self
                .overlays
                .fires
                .iter()
                .find(|f| f.fire_id == id)
                .map(|f| f.tooltip.as_str()),
            Selected::Resource(id) => self
                .overlays
                .resources
                .iter()
                .find(|r| r.resource_id == id)
                .map(|r| r.tooltip.as_str()),
        }
    }

    /// Click on the map: fire the matching selection hook
    pub fn select_at(&mut self, px: i32, py: i32) -> Option<Selected> {
        let hit = self.hit_test(px, py)?;
        self.notify(hit);
        Some(hit)
    }

    /// Select a risk area by id, as the table's "view" action does
    pub fn select_area(&mut self, id: u64) -> bool {
        if self.data.area(id).is_none() {
            return false;
        }
        self.notify(Selected::Area(id));
        true
    }

    fn notify(&mut self, selected: Selected) {
        match selected {
            Selected::Area(id) => {
                if let Some(area) = self.data.area(id) {
                    self.observer.area_selected(area);
                }
            }
            Selected::Fire(id) => {
                if let Some(fire) = self.data.fire(id) {
                    self.observer.fire_selected(fire);
                }
            }
            Selected::Resource(id) => {
                if let Some(res) = self.data.resource(id) {
                    self.observer.resource_selected(res);
                }
            }
        }
    }
}
