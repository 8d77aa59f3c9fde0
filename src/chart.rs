use crate::risk::{RiskColor, RiskLevel};

/// One bar of the regional risk chart
#[derive(Clone, Debug, PartialEq)]
pub struct RegionBar {
    pub label: &'static str,
    pub value: f64,
}

impl RegionBar {
    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.value)
    }

    pub fn color(&self) -> RiskColor {
        self.level().color()
    }

    /// "85% (High)"
    pub fn caption(&self) -> String {
        format!("{:.0}% ({})", self.value * 100.0, self.level().label())
    }
}

/// Fixed regional overview shown next to the map
#[derive(Clone, Debug)]
pub struct RiskChart {
    bars: Vec<RegionBar>,
    pub threshold: f64,
}

impl Default for RiskChart {
    fn default() -> Self {
        Self {
            bars: vec![
                RegionBar { label: "Northern", value: 0.85 },
                RegionBar { label: "Eastern", value: 0.45 },
                RegionBar { label: "Southern", value: 0.65 },
                RegionBar { label: "Western", value: 0.30 },
                RegionBar { label: "Central", value: 0.70 },
            ],
            threshold: 0.0,
        }
    }
}

impl RiskChart {
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    /// Bars at or above the threshold, in their original order
    pub fn visible(&self) -> impl Iterator<Item = &RegionBar> {
        let threshold = self.threshold;
        self.bars.iter().filter(move |b| b.value >= threshold)
    }

    /// Badge for the threshold control itself
    pub fn threshold_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_filters_inclusive() {
        let mut chart = RiskChart::default();
        assert_eq!(chart.visible().count(), 5);
        chart.set_threshold(0.65);
        let labels: Vec<&str> = chart.visible().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Northern", "Southern", "Central"]);
        chart.set_threshold(0.9);
        assert_eq!(chart.visible().count(), 0);
    }

    #[test]
    fn test_bar_colors_follow_classifier() {
        let chart = RiskChart::default();
        let first = chart.visible().next().unwrap();
        assert_eq!(first.color(), RiskColor::ORANGE);
        assert_eq!(first.caption(), "85% (High)");
    }
}
