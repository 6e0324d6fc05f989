use egui::{Pos2, Rect};

use crate::image_source::ScaledImage;

/// Screen position to canvas-local display coordinates.
pub fn to_canvas(rect: Rect, pos: Pos2) -> Pos2 {
    Pos2::new(pos.x - rect.min.x, pos.y - rect.min.y)
}

pub fn to_screen(rect: Rect, pos: Pos2) -> Pos2 {
    rect.min + pos.to_vec2()
}

pub fn color_image(img: &ScaledImage) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(img.size, &img.pixels)
}
