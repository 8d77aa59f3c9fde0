mod fire_map;
mod geometry;
mod overlay;
mod projection;
mod renderer;

pub use fire_map::{fetch_or_sample, FireRiskMap, LoadOutcome, MapObserver, MapOptions, NoopObserver, Selected};
pub use overlay::{FireOverlay, Overlays, ResourceOverlay, RiskZoneOverlay, ViewState, ZONE_FILL_OPACITY};
pub use projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
pub use renderer::{Label, LineString, Lod, MapLayers, MapRenderer};
