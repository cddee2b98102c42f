//! Colors and stroke styles of map overlays

use std::fmt;

/// Opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Stroke of a polyline or routed segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Rgb,
    pub opacity: f32,
    pub width: f32,
}

/// Fill and outline of a marker pin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinStyle {
    pub fill: Rgb,
    pub stroke: Rgb,
    pub stroke_width: f32,
    pub label_color: Rgb,
}

impl Default for PinStyle {
    fn default() -> Self {
        Self {
            fill: Rgb::new(0x60, 0xa5, 0xfa),
            stroke: Rgb::new(0x3b, 0x82, 0xf6),
            stroke_width: 2.0,
            label_color: Rgb::new(0xff, 0xff, 0xff),
        }
    }
}

/// Blue, red, green, amber, violet, pink, cyan, orange
pub const DEFAULT_SEGMENT_COLORS: [Rgb; 8] = [
    Rgb::new(0x3b, 0x82, 0xf6),
    Rgb::new(0xef, 0x44, 0x44),
    Rgb::new(0x10, 0xb9, 0x81),
    Rgb::new(0xf5, 0x9e, 0x0b),
    Rgb::new(0x8b, 0x5c, 0xf6),
    Rgb::new(0xec, 0x48, 0x99),
    Rgb::new(0x06, 0xb6, 0xd4),
    Rgb::new(0xf9, 0x73, 0x16),
];

/// Colors assigned to transit segments, cycling when there are more
/// segments than colors
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPalette {
    colors: Vec<Rgb>,
    pub opacity: f32,
    pub width: f32,
}

impl Default for SegmentPalette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_SEGMENT_COLORS.to_vec(),
            opacity: 0.8,
            width: 5.0,
        }
    }
}

impl SegmentPalette {
    /// Palette with custom colors; an empty list keeps the defaults
    pub fn with_colors(mut self, colors: Vec<Rgb>) -> Self {
        if !colors.is_empty() {
            self.colors = colors;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color_for(&self, segment_index: usize) -> Rgb {
        self.colors
            .get(segment_index % self.colors.len().max(1))
            .copied()
            .unwrap_or(DEFAULT_SEGMENT_COLORS[0])
    }

    pub fn style_for(&self, segment_index: usize) -> LineStyle {
        LineStyle {
            color: self.color_for(segment_index),
            opacity: self.opacity,
            width: self.width,
        }
    }
}

/// Tunables of the projection engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Zoom the map is created at, before any fit
    pub seed_zoom: f64,
    pub route_line: LineStyle,
    pub segments: SegmentPalette,
    pub pin: PinStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed_zoom: 8.0,
            route_line: LineStyle {
                color: Rgb::new(0x03, 0x02, 0x13),
                opacity: 1.0,
                width: 3.0,
            },
            segments: SegmentPalette::default(),
            pin: PinStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_colors_cycle() {
        let palette = SegmentPalette::default();
        assert_eq!(palette.len(), 8);
        assert_eq!(palette.color_for(0), Rgb::from_hex("#3b82f6").unwrap());
        assert_eq!(palette.color_for(7), Rgb::from_hex("#f97316").unwrap());
        assert_eq!(palette.color_for(8), palette.color_for(0));
        assert_eq!(palette.color_for(9), palette.color_for(1));
    }

    #[test]
    fn test_custom_palette() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let palette = SegmentPalette::default().with_colors(vec![red, blue]);
        assert_eq!(palette.color_for(2), red);
        assert_eq!(palette.style_for(3).color, blue);

        let unchanged = SegmentPalette::default().with_colors(Vec::new());
        assert_eq!(unchanged.len(), 8);
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("030213"), Some(Rgb::new(3, 2, 19)));
        assert_eq!(Rgb::new(0x60, 0xa5, 0xfa).to_string(), "#60a5fa");
        assert!(Rgb::from_hex("#fff").is_none());
        assert!(Rgb::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.seed_zoom, 8.0);
        assert_eq!(config.route_line.width, 3.0);
        assert_eq!(config.segments.style_for(0).opacity, 0.8);
    }
}
