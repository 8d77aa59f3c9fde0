use serde::{Deserialize, Serialize};
use tracing::warn;

/// Geographic point in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskArea {
    pub id: u64,
    pub name: String,
    pub center: LatLng,
    /// Zone radius in meters
    #[serde(default)]
    pub radius: f64,
    pub risk_score: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveFire {
    pub id: u64,
    pub name: String,
    pub location: LatLng,
    pub intensity: f64,
    /// Start date as sent by the API, displayed verbatim
    #[serde(default)]
    pub started: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: LatLng,
    #[serde(default)]
    pub personnel: u32,
}

/// One consistent snapshot of everything the map shows.
/// Replaced as a whole on every load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub risk_areas: Vec<RiskArea>,
    #[serde(default)]
    pub active_fires: Vec<ActiveFire>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Dataset {
    /// Built-in demo data used whenever the live source is unavailable
    pub fn sample() -> Self {
        Self {
            risk_areas: vec![
                RiskArea {
                    id: 1,
                    name: "Northern Forest Region".into(),
                    center: LatLng::new(37.7749, -122.4194),
                    radius: 50_000.0,
                    risk_score: 0.85,
                    risk_factors: vec![
                        "High temperature".into(),
                        "Low humidity".into(),
                        "Dry vegetation".into(),
                    ],
                },
                RiskArea {
                    id: 2,
                    name: "Eastern Woodland".into(),
                    center: LatLng::new(34.0522, -118.2437),
                    radius: 40_000.0,
                    risk_score: 0.65,
                    risk_factors: vec!["Moderate wind".into(), "Dry conditions".into()],
                },
                RiskArea {
                    id: 3,
                    name: "Southern Valley".into(),
                    center: LatLng::new(40.7128, -74.0060),
                    radius: 30_000.0,
                    risk_score: 0.35,
                    risk_factors: vec!["Recent precipitation".into()],
                },
            ],
            active_fires: vec![
                ActiveFire {
                    id: 101,
                    name: "Redwood Complex Fire".into(),
                    location: LatLng::new(37.8, -122.5),
                    intensity: 0.9,
                    started: "2025-05-24".into(),
                },
                ActiveFire {
                    id: 102,
                    name: "Eagle Creek Fire".into(),
                    location: LatLng::new(34.1, -118.3),
                    intensity: 0.7,
                    started: "2025-05-25".into(),
                },
            ],
            resources: vec![
                Resource {
                    id: 201,
                    name: "Team Alpha".into(),
                    kind: "Fire Brigade".into(),
                    location: LatLng::new(37.75, -122.45),
                    personnel: 15,
                },
                Resource {
                    id: 202,
                    name: "Team Bravo".into(),
                    kind: "Helicopter Unit".into(),
                    location: LatLng::new(34.05, -118.25),
                    personnel: 8,
                },
            ],
        }
    }

    /// Clamp scores and intensities into [0, 1]; returns how many values were out of range.
    pub fn normalize(&mut self) -> usize {
        let mut fixed = 0;
        for area in &mut self.risk_areas {
            if let Some(v) = clamp_unit(area.risk_score) {
                warn!(id = area.id, score = area.risk_score, "risk score out of range, clamping");
                area.risk_score = v;
                fixed += 1;
            }
            if !area.radius.is_finite() || area.radius < 0.0 {
                area.radius = 0.0;
                fixed += 1;
            }
        }
        for fire in &mut self.active_fires {
            if let Some(v) = clamp_unit(fire.intensity) {
                warn!(id = fire.id, intensity = fire.intensity, "fire intensity out of range, clamping");
                fire.intensity = v;
                fixed += 1;
            }
        }
        fixed
    }

    pub fn area(&self, id: u64) -> Option<&RiskArea> {
        self.risk_areas.iter().find(|a| a.id == id)
    }

    pub fn fire(&self, id: u64) -> Option<&ActiveFire> {
        self.active_fires.iter().find(|f| f.id == id)
    }

    pub fn resource(&self, id: u64) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Risk areas ordered by descending score (table order)
    pub fn areas_by_risk(&self) -> Vec<&RiskArea> {
        let mut areas: Vec<&RiskArea> = self.risk_areas.iter().collect();
        areas.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        areas
    }
}

/// Returns the clamped value only when clamping changed something
fn clamp_unit(v: f64) -> Option<f64> {
    if v.is_nan() {
        Some(0.0)
    } else if !(0.0..=1.0).contains(&v) {
        Some(v.clamp(0.0, 1.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_missing_collections() {
        let json = r#"{"risk_areas":[{"id":7,"name":"Ridge","center":{"lat":1.0,"lng":2.0},"risk_score":0.5}]}"#;
        let data: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(data.risk_areas.len(), 1);
        assert_eq!(data.risk_areas[0].radius, 0.0);
        assert!(data.risk_areas[0].risk_factors.is_empty());
        assert!(data.active_fires.is_empty());
        assert!(data.resources.is_empty());
    }

    #[test]
    fn test_resource_type_field() {
        let json = r#"{"id":1,"name":"A","type":"Air Tanker","location":{"lat":0.0,"lng":0.0},"personnel":4}"#;
        let res: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(res.kind, "Air Tanker");
        let back = serde_json::to_value(&res).unwrap();
        assert_eq!(back["type"], "Air Tanker");
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        let mut data = Dataset::sample();
        data.risk_areas[0].risk_score = 1.4;
        data.active_fires[0].intensity = -0.2;
        assert_eq!(data.normalize(), 2);
        assert_eq!(data.risk_areas[0].risk_score, 1.0);
        assert_eq!(data.active_fires[0].intensity, 0.0);
        assert_eq!(data.normalize(), 0);
    }

    #[test]
    fn test_areas_by_risk_descending() {
        let data = Dataset::sample();
        let scores: Vec<f64> = data.areas_by_risk().iter().map(|a| a.risk_score).collect();
        assert_eq!(scores, vec![0.85, 0.65, 0.35]);
    }

    #[test]
    fn test_sample_is_in_range() {
        let mut data = Dataset::sample();
        assert_eq!(data.normalize(), 0);
        assert!(data.area(2).is_some());
        assert!(data.fire(101).is_some());
        assert!(data.resource(202).is_some());
        assert!(data.area(99).is_none());
    }
}
