//! Color palette shared by the graph canvas and the side panels.
//!
//! All colors should be sourced from here to keep the canvas and the
//! panels visually consistent.

use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Graph canvas - darkest layer
    pub const GRAPH: Color32 = Color32::from_rgb(2, 6, 23);

    /// Side panel background
    pub const PANEL: Color32 = Color32::from_rgb(15, 23, 42);

    /// Cards and the tooltip box
    pub const SURFACE: Color32 = Color32::from_rgb(30, 41, 59);
}

/// Edge stroke colors, one per settlement status
pub mod status {
    use super::*;

    pub const SETTLED: Color32 = Color32::from_rgb(34, 197, 94);
    pub const PROCESSING: Color32 = Color32::from_rgb(14, 165, 233);
    pub const PENDING: Color32 = Color32::from_rgb(245, 158, 11);
    pub const FAILED: Color32 = Color32::from_rgb(239, 68, 68);
    pub const CANCELED: Color32 = Color32::from_rgb(100, 116, 139);
}

/// Node fills and strokes by role
pub mod node {
    use super::*;

    pub const USER_FILL: Color32 = Color32::from_rgb(8, 51, 68);
    pub const USER_STROKE: Color32 = Color32::from_rgb(6, 182, 212);
    pub const RETAILER_FILL: Color32 = Color32::from_rgb(30, 41, 59);
    pub const RETAILER_STROKE: Color32 = Color32::from_rgb(100, 116, 139);

    /// Anomaly highlight ring
    pub const HIGHLIGHT_STROKE: Color32 = Color32::from_rgb(34, 211, 238);
}

/// Text colors
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(241, 245, 249);
    pub const SECONDARY: Color32 = Color32::from_rgb(148, 163, 184);
    pub const MUTED: Color32 = Color32::from_rgb(100, 116, 139);
}

/// Accent colors for panel widgets
pub mod accent {
    use super::*;

    pub const CYAN: Color32 = Color32::from_rgb(6, 182, 212);
    pub const LIVE: Color32 = Color32::from_rgb(74, 222, 128);
    pub const WARNING: Color32 = Color32::from_rgb(251, 191, 36);
}

/// Multiply a color's alpha by `opacity` in `0..=1`
pub fn faded(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}
