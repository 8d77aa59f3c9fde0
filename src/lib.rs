//! Terminal wildfire-risk dashboard: a Braille risk map with active fires
//! and response resources, plus the guardian missions and activity feed
//! that sit around it.

pub mod api;
pub mod app;
pub mod braille;
pub mod chart;
pub mod dashboard;
pub mod data;
pub mod feed;
pub mod gamification;
pub mod map;
pub mod model;
pub mod panels;
pub mod risk;
pub mod settings;
pub mod toast;
pub mod ui;
pub mod worker;
