//! Details panel and regions table, fed by the map's selection hooks.

use tracing::info;

use crate::map::MapObserver;
use crate::model::{ActiveFire, Dataset, LatLng, Resource, RiskArea};
use crate::risk::{alert_action, recommendations, RiskLevel, Subject};

/// Contents of the details panel
#[derive(Clone, Debug, PartialEq)]
pub enum Details {
    Risk {
        subject: Subject,
        id: u64,
        name: String,
        score: f64,
        level: RiskLevel,
        factors: Vec<String>,
        recommendations: Vec<&'static str>,
        alert_action: &'static str,
    },
    Resource {
        id: u64,
        name: String,
        kind: String,
        personnel: u32,
        location: LatLng,
    },
}

impl Details {
    fn risk(subject: Subject, id: u64, name: &str, score: f64, factors: Vec<String>) -> Self {
        Details::Risk {
            subject,
            id,
            name: name.to_string(),
            score,
            level: RiskLevel::from_score(score),
            factors,
            recommendations: recommendations(subject, score).to_vec(),
            alert_action: alert_action(subject),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Details::Risk { name, .. } | Details::Resource { name, .. } => name,
        }
    }
}

/// One row of the regions table
#[derive(Clone, Debug, PartialEq)]
pub struct RegionRow {
    pub id: u64,
    pub name: String,
    pub level: RiskLevel,
    pub score: f64,
    pub factors: String,
    pub center: LatLng,
}

impl RegionRow {
    fn from_area(area: &RiskArea) -> Self {
        Self {
            id: area.id,
            name: area.name.clone(),
            level: RiskLevel::from_score(area.risk_score),
            score: area.risk_score,
            factors: area.risk_factors.join(", "),
            center: area.center,
        }
    }
}

/// Observer wiring the map to the side panels
#[derive(Clone, Debug, Default)]
pub struct DashboardHooks {
    pub details: Option<Details>,
    pub rows: Vec<RegionRow>,
}

impl MapObserver for DashboardHooks {
    fn area_selected(&mut self, area: &RiskArea) {
        info!(area = %area.name, "area selected");
        self.details = Some(Details::risk(
            Subject::Area,
            area.id,
            &area.name,
            area.risk_score,
            area.risk_factors.clone(),
        ));
    }

    /// Fires are shown as a risk subject scored by their intensity
    fn fire_selected(&mut self, fire: &ActiveFire) {
        info!(fire = %fire.name, "fire selected");
        self.details = Some(Details::risk(
            Subject::ActiveFire,
            fire.id,
            &fire.name,
            fire.intensity,
            vec!["Active fire".to_string(), format!("Started on {}", fire.started)],
        ));
    }

    fn resource_selected(&mut self, resource: &Resource) {
        info!(resource = %resource.name, "resource selected");
        self.details = Some(Details::Resource {
            id: resource.id,
            name: resource.name.clone(),
            kind: resource.kind.clone(),
            personnel: resource.personnel,
            location: resource.location,
        });
    }

    fn map_updated(&mut self, data: &Dataset) {
        self.rows = data.areas_by_risk().into_iter().map(RegionRow::from_area).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_sorted_by_descending_risk() {
        let mut hooks = DashboardHooks::default();
        hooks.map_updated(&Dataset::sample());
        let names: Vec<&str> = hooks.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Northern Forest Region", "Eastern Woodland", "Southern Valley"]);
        assert_eq!(hooks.rows[0].level, RiskLevel::High);
        assert_eq!(hooks.rows[0].factors, "High temperature, Low humidity, Dry vegetation");
    }

    #[test]
    fn test_fire_selection_shows_evacuation_plan() {
        let data = Dataset::sample();
        let mut hooks = DashboardHooks::default();
        hooks.fire_selected(&data.active_fires[1]);
        match hooks.details {
            Some(Details::Risk { subject, score, ref factors, alert_action, ref recommendations, .. }) => {
                assert_eq!(subject, Subject::ActiveFire);
                assert_eq!(score, 0.7);
                assert_eq!(factors[1], "Started on 2025-05-25");
                assert_eq!(alert_action, "Send Evacuation Alert");
                assert_eq!(recommendations.len(), 3);
            }
            ref other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn test_area_selection() {
        let data = Dataset::sample();
        let mut hooks = DashboardHooks::default();
        hooks.area_selected(&data.risk_areas[2]);
        let details = hooks.details.as_ref().unwrap();
        assert_eq!(details.name(), "Southern Valley");
        assert!(matches!(details, Details::Risk { level: RiskLevel::VeryLow, alert_action: "Send Warning Alert", .. }));
    }

    #[test]
    fn test_resource_selection() {
        let data = Dataset::sample();
        let mut hooks = DashboardHooks::default();
        hooks.resource_selected(&data.resources[0]);
        assert!(matches!(hooks.details, Some(Details::Resource { personnel: 15, .. })));
    }
}
