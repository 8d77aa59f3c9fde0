use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::overlay::Overlays;
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

const BASE_COLOR: Color = Color::DarkGray;
const STATE_COLOR: Color = Color::Rgb(70, 70, 70);
const FIRE_CORE: Color = Color::Rgb(0xd7, 0x30, 0x27);
const FIRE_GLOW: Color = Color::Rgb(0xff, 0x8c, 0x00);
const RESOURCE_COLOR: Color = Color::Rgb(0x1e, 0x90, 0xff);

/// Level of detail for base map data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on slippy zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 4.0 {
            Lod::Low
        } else if zoom < 7.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// Display settings for base map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_states: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_states: true,
            show_labels: true,
        }
    }
}

/// Text drawn on top of the canvases, in character coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub color: Color,
}

/// Rasterized map, back to front
pub struct MapLayers {
    pub base: BrailleCanvas,
    pub zones: BrailleCanvas,
    pub fires: BrailleCanvas,
    pub labels: Vec<Label>,
}

/// Rasterizes the base map and the overlay groups onto braille canvases
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
    pub states: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            states: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Coastlines for the LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates: &[&Vec<LineString>] = match lod {
            Lod::High => &[&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => &[&self.coastlines_medium, &self.coastlines_low],
            Lod::Low => &[&self.coastlines_low],
        };
        candidates
            .iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Rasterize everything for a map area of the given character size.
    /// The viewport must already be sized to `width * 2` by `height * 4` pixels.
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, overlays: &Overlays) -> MapLayers {
        let mut layers = MapLayers {
            base: BrailleCanvas::new(width, height),
            zones: BrailleCanvas::new(width, height),
            fires: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        };

        self.render_base(&mut layers.base, viewport);
        render_zones(&mut layers.zones, viewport, overlays);
        render_fires(&mut layers.fires, viewport, overlays);
        if self.settings.show_labels {
            layers.labels = resource_labels(viewport, overlays);
        }
        layers
    }

    fn render_base(&self, canvas: &mut BrailleCanvas, viewport: &Viewport) {
        let lod = Lod::from_zoom(viewport.zoom);
        canvas.set_pen(BASE_COLOR);

        if self.settings.show_coastlines {
            for line in self.coastlines(lod) {
                draw_linestring(canvas, line, viewport);
            }
        }
        if self.settings.show_borders {
            for line in self.borders(lod) {
                draw_linestring(canvas, line, viewport);
            }
        }
        if self.settings.show_states && viewport.zoom >= 4.0 {
            canvas.set_pen(STATE_COLOR);
            for line in &self.states {
                draw_linestring(canvas, line, viewport);
            }
        }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn add_state(&mut self, line: LineString) {
        self.states.push(line);
    }

    /// Check if any coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_states(&mut self) {
        self.settings.show_states = !self.settings.show_states;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Filled circles, lowest risk first so the riskiest zone ends up on top
fn render_zones(canvas: &mut BrailleCanvas, viewport: &Viewport, overlays: &Overlays) {
    let mut zones: Vec<_> = overlays.risk_zones.iter().collect();
    zones.sort_by(|a, b| a.risk_score.total_cmp(&b.risk_score));

    for zone in zones {
        let (px, py) = viewport.project(zone.center.lng, zone.center.lat);
        let radius = viewport.meters_to_pixels(zone.radius_m, zone.center.lat).round().max(1.0) as i32;
        if !viewport.circle_might_be_visible(px, py, radius) {
            continue;
        }
        canvas.set_pen(zone.color.into());
        draw_circle(canvas, px, py, radius);
    }
}

/// A glow ring scaled by intensity around a solid core
fn render_fires(canvas: &mut BrailleCanvas, viewport: &Viewport, overlays: &Overlays) {
    for fire in &overlays.fires {
        let (px, py) = viewport.project(fire.location.lng, fire.location.lat);
        let glow = (fire.glow_spread / 4.0).round().max(2.0) as i32;
        if !viewport.circle_might_be_visible(px, py, glow) {
            continue;
        }
        canvas.set_pen(FIRE_GLOW);
        draw_ring(canvas, px, py, glow);
        canvas.set_pen(FIRE_CORE);
        draw_circle(canvas, px, py, 1);
    }
}

fn resource_labels(viewport: &Viewport, overlays: &Overlays) -> Vec<Label> {
    overlays
        .resources
        .iter()
        .filter_map(|res| {
            let (px, py) = viewport.project(res.location.lng, res.location.lat);
            if px < 0 || py < 0 || px >= viewport.width as i32 || py >= viewport.height as i32 {
                return None;
            }
            Some(Label {
                x: (px / 2) as u16,
                y: (py / 4) as u16,
                text: format!("●{}", res.badge),
                color: RESOURCE_COLOR,
            })
        })
        .collect()
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);
        if let Some((prev_x, prev_y)) = prev {
            // Skip segments that wrap around the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width.max(1) * 4 && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}
