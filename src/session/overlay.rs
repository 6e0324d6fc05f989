use egui::{Pos2, Vec2};

/// Guide lines that follow the pointer across the whole canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crosshair {
    pub pos: Pos2,
}

impl Default for Crosshair {
    fn default() -> Self {
        Self { pos: Pos2::ZERO }
    }
}

/// The click marker for the active image plus its coordinate label.
///
/// The label background is sized from the rendered text, so it is derived
/// at paint time from `label_anchor()` and the text's galley.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// canvas-local display position
    pub display: Pos2,
    /// source image coordinates
    pub source: (f64, f64),
    pub radius: f32,
    pub label_offset: f32,
}

impl Marker {
    pub fn label(&self) -> String {
        format_coords(self.source)
    }

    /// Top-left corner of the label, to the right of the marker.
    pub fn label_anchor(&self) -> Pos2 {
        self.display + Vec2::new(self.label_offset, 0.)
    }
}

pub fn format_coords((x, y): (f64, f64)) -> String {
    format!("({:.2}, {:.2})", x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_has_two_decimals() {
        assert_eq!(format_coords((30., 40.)), "(30.00, 40.00)");
        assert_eq!(format_coords((1. / 3., 12.346)), "(0.33, 12.35)");
    }

    #[test]
    fn label_sits_right_of_marker() {
        let marker = Marker {
            display: Pos2::new(100., 50.),
            source: (50., 25.),
            radius: 5.,
            label_offset: 10.,
        };
        assert_eq!(marker.label_anchor(), Pos2::new(110., 50.));
        assert_eq!(marker.label(), "(50.00, 25.00)");
    }
}
