//! Pure overlay construction: which items are on the map and how they look.
//! Nothing here knows about terminals; the renderer rasterizes the result.

use crate::model::{Dataset, LatLng};
use crate::risk::{risk_color, RiskColor};

/// Fill opacity of every risk zone
pub const ZONE_FILL_OPACITY: f64 = 0.4;

/// Visibility flags and the risk filter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub show_fires: bool,
    pub show_risk_zones: bool,
    pub show_resources: bool,
    pub risk_threshold: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            show_fires: true,
            show_risk_zones: true,
            show_resources: true,
            risk_threshold: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RiskZoneOverlay {
    pub area_id: u64,
    pub center: LatLng,
    pub radius_m: f64,
    pub risk_score: f64,
    pub color: RiskColor,
    pub fill_opacity: f64,
    pub tooltip: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FireOverlay {
    pub fire_id: u64,
    pub location: LatLng,
    pub intensity: f64,
    /// Glow blur radius, linear in intensity
    pub glow_blur: f64,
    /// Glow spread radius, linear in intensity
    pub glow_spread: f64,
    pub tooltip: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceOverlay {
    pub resource_id: u64,
    pub location: LatLng,
    pub badge: String,
    pub tooltip: String,
}

/// The three overlay groups of the map
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlays {
    pub risk_zones: Vec<RiskZoneOverlay>,
    pub fires: Vec<FireOverlay>,
    pub resources: Vec<ResourceOverlay>,
}

impl Overlays {
    pub fn clear(&mut self) {
        self.risk_zones.clear();
        self.fires.clear();
        self.resources.clear();
    }

    /// Rebuild every group from the snapshot and view state
    pub fn rebuild(&mut self, data: &Dataset, view: &ViewState) {
        self.clear();

        if view.show_risk_zones {
            self.risk_zones.extend(
                data.risk_areas
                    .iter()
                    .filter(|area| area.risk_score >= view.risk_threshold)
                    .map(|area| RiskZoneOverlay {
                        area_id: area.id,
                        center: area.center,
                        radius_m: area.radius,
                        risk_score: area.risk_score,
                        color: risk_color(area.risk_score),
                        fill_opacity: ZONE_FILL_OPACITY,
                        tooltip: format!("{} - Risk: {:.2}", area.name, area.risk_score),
                    }),
            );
        }

        if view.show_fires {
            self.fires.extend(data.active_fires.iter().map(|fire| FireOverlay {
                fire_id: fire.id,
                location: fire.location,
                intensity: fire.intensity,
                glow_blur: 10.0 + fire.intensity * 20.0,
                glow_spread: 8.0 + fire.intensity * 8.0,
                tooltip: format!("{} - Active since: {}", fire.name, fire.started),
            }));
        }

        if view.show_resources {
            self.resources.extend(data.resources.iter().map(|res| ResourceOverlay {
                resource_id: res.id,
                location: res.location,
                badge: res.personnel.to_string(),
                tooltip: format!("{} - {}", res.name, res.kind),
            }));
        }
    }

    pub fn build(data: &Dataset, view: &ViewState) -> Self {
        let mut overlays = Self::default();
        overlays.rebuild(data, view);
        overlays
    }

    pub fn len(&self) -> usize {
        self.risk_zones.len() + self.fires.len() + self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dataset;

    fn view(threshold: f64) -> ViewState {
        ViewState {
            risk_threshold: threshold,
            ..ViewState::default()
        }
    }

    #[test]
    fn test_threshold_filters_zones() {
        let data = Dataset::sample();
        let ids = |t| {
            Overlays::build(&data, &view(t))
                .risk_zones
                .iter()
                .map(|z| z.area_id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(0.0), vec![1, 2, 3]);
        assert_eq!(ids(0.65), vec![1, 2]);
        assert_eq!(ids(0.66), vec![1]);
        assert!(ids(0.86).is_empty());
    }

    #[test]
    fn test_fires_and_resources_ignore_threshold() {
        let data = Dataset::sample();
        let overlays = Overlays::build(&data, &view(1.0));
        assert!(overlays.risk_zones.is_empty());
        assert_eq!(overlays.fires.len(), 2);
        assert_eq!(overlays.resources.len(), 2);
    }

    #[test]
    fn test_hidden_layers_are_empty() {
        let data = Dataset::sample();
        let hidden = ViewState {
            show_fires: false,
            show_risk_zones: false,
            show_resources: false,
            risk_threshold: 0.0,
        };
        assert!(Overlays::build(&data, &hidden).is_empty());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let data = Dataset::sample();
        let mut overlays = Overlays::default();
        overlays.rebuild(&data, &view(0.3));
        let first = overlays.clone();
        overlays.rebuild(&data, &view(0.3));
        assert_eq!(first, overlays);
    }

    #[test]
    fn test_zone_and_marker_attributes() {
        let data = Dataset::sample();
        let overlays = Overlays::build(&data, &view(0.0));

        let zone = &overlays.risk_zones[0];
        assert_eq!(zone.color, RiskColor::ORANGE);
        assert_eq!(zone.fill_opacity, 0.4);
        assert_eq!(zone.radius_m, 50_000.0);
        assert_eq!(zone.tooltip, "Northern Forest Region - Risk: 0.85");

        let fire = &overlays.fires[0];
        assert!((fire.glow_blur - 28.0).abs() < 1e-9);
        assert!((fire.glow_spread - 15.2).abs() < 1e-9);
        assert_eq!(fire.tooltip, "Redwood Complex Fire - Active since: 2025-05-24");

        let res = &overlays.resources[1];
        assert_eq!(res.badge, "8");
        assert_eq!(res.tooltip, "Team Bravo - Helicopter Unit");
    }
}
