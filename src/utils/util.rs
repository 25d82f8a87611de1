//! # Utility Module
//!
//! This module contains miscellaneous helper functions used throughout TileMapEd.
//!
//! ## Example Function: `normalize_scale`
//!
//! `normalize_scale` turns a requested zoom factor into the one the editor
//! actually uses: non-positive or non-finite values are rejected, everything
//! else is clamped to the supported zoom range and rounded to whole percent.

/// Smallest zoom factor the canvas supports.
pub const MIN_SCALE: f32 = 0.1;
/// Largest zoom factor the canvas supports.
pub const MAX_SCALE: f32 = 10.0;
/// Zoom step used by the toolbar buttons and keyboard shortcuts.
pub const SCALE_STEP: f32 = 0.1;

/// Clamps a value between a minimum and maximum.
///
/// # Examples
///
/// ```
/// use tilemap_ed::utils::util::clamp;
///
/// assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
/// assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// ```
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Validates a requested scale.
///
/// Returns `None` when the request must be ignored, otherwise the clamped
/// scale rounded to hundredths (so repeated `±0.1` steps never drift).
///
/// ```
/// use tilemap_ed::utils::util::normalize_scale;
///
/// assert_eq!(normalize_scale(0.0), None);
/// assert_eq!(normalize_scale(1.2999), Some(1.3));
/// ```
pub fn normalize_scale(requested: f32) -> Option<f32> {
    if !requested.is_finite() || requested <= 0.0 {
        return None;
    }
    let clamped = clamp(requested, MIN_SCALE, MAX_SCALE);
    Some((clamped * 100.0).round() / 100.0)
}

/// Formats a scale as the percentage label shown in the toolbar.
pub fn scale_percent(scale: f32) -> String {
    format!("{}%", (scale * 100.0).round() as i32)
}

/// Uppercases the first character and lowercases the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
