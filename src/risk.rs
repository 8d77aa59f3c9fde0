//! Risk score classification shared by the map, table, details panel and chart.
//!
//! Bands are checked from highest to lowest and the first match wins, so a
//! score sitting exactly on a threshold belongs to the higher band.

use ratatui::style::Color;

pub const EXTREME: f64 = 0.9;
pub const HIGH: f64 = 0.8;
pub const MEDIUM: f64 = 0.6;
pub const LOW: f64 = 0.4;

/// Discrete risk band for a 0–1 score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    Extreme,
    High,
    Medium,
    Low,
    VeryLow,
}

impl RiskLevel {
    /// All bands, highest first (legend order)
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Extreme,
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Low,
        RiskLevel::VeryLow,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= EXTREME {
            RiskLevel::Extreme
        } else if score >= HIGH {
            RiskLevel::High
        } else if score >= MEDIUM {
            RiskLevel::Medium
        } else if score >= LOW {
            RiskLevel::Low
        } else {
            RiskLevel::VeryLow
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Extreme => "Extreme",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::VeryLow => "Very Low",
        }
    }

    /// Badge class name, kept stable for exports and styling lookups
    pub fn class(self) -> &'static str {
        match self {
            RiskLevel::Extreme => "bg-danger",
            RiskLevel::High => "bg-warning text-dark",
            RiskLevel::Medium => "bg-info text-dark",
            RiskLevel::Low | RiskLevel::VeryLow => "bg-success",
        }
    }

    pub fn color(self) -> RiskColor {
        match self {
            RiskLevel::Extreme => RiskColor::RED,
            RiskLevel::High => RiskColor::ORANGE,
            RiskLevel::Medium => RiskColor::YELLOW,
            RiskLevel::Low => RiskColor::LIGHT_GREEN,
            RiskLevel::VeryLow => RiskColor::GREEN,
        }
    }

    /// Lower bound of the band (0.0 for Very Low)
    pub fn floor(self) -> f64 {
        match self {
            RiskLevel::Extreme => EXTREME,
            RiskLevel::High => HIGH,
            RiskLevel::Medium => MEDIUM,
            RiskLevel::Low => LOW,
            RiskLevel::VeryLow => 0.0,
        }
    }
}

pub fn risk_level(score: f64) -> &'static str {
    RiskLevel::from_score(score).label()
}

pub fn risk_class(score: f64) -> &'static str {
    RiskLevel::from_score(score).class()
}

pub fn risk_color(score: f64) -> RiskColor {
    RiskLevel::from_score(score).color()
}

/// 24-bit color used for zone fills, badges and chart bars
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RiskColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RiskColor {
    pub const RED: RiskColor = RiskColor::rgb(0xd7, 0x30, 0x27);
    pub const ORANGE: RiskColor = RiskColor::rgb(0xfc, 0x8d, 0x59);
    pub const YELLOW: RiskColor = RiskColor::rgb(0xfe, 0xe0, 0x8b);
    pub const LIGHT_GREEN: RiskColor = RiskColor::rgb(0xd9, 0xef, 0x8b);
    pub const GREEN: RiskColor = RiskColor::rgb(0x91, 0xcf, 0x60);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<RiskColor> for Color {
    fn from(c: RiskColor) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

/// What the details panel is describing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    Area,
    ActiveFire,
}

pub fn recommendations(subject: Subject, score: f64) -> &'static [&'static str] {
    if subject == Subject::ActiveFire {
        return &[
            "Deploy firefighting resources immediately",
            "Evacuate nearby communities",
            "Establish containment perimeter",
        ];
    }

    // Strictly greater than: a 0.8 area gets the "High" playbook, not the extreme one
    if score > HIGH {
        &[
            "Deploy preventive resources",
            "Issue evacuation warnings",
            "Establish firebreaks",
            "Increase monitoring frequency",
        ]
    } else if score > MEDIUM {
        &[
            "Increase patrols in the area",
            "Prepare resource allocation plan",
            "Alert local fire departments",
        ]
    } else if score > LOW {
        &[
            "Monitor conditions regularly",
            "Review emergency response plans",
        ]
    } else {
        &[
            "Standard monitoring procedures",
            "No additional action required",
        ]
    }
}

pub fn alert_action(subject: Subject) -> &'static str {
    match subject {
        Subject::ActiveFire => "Send Evacuation Alert",
        Subject::Area => "Send Warning Alert",
    }
}
