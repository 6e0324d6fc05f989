use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use egui::{Color32, FontId, Rect, RichText, Sense, Stroke, Vec2};

use super::{
    ui_types::App,
    utils::{color_image, to_canvas, to_screen},
};
use crate::session::SessionEvent;

const CROSSHAIR_COLOR: Color32 = Color32::RED;
const MARKER_COLOR: Color32 = Color32::RED;
const LABEL_COLOR: Color32 = Color32::BLACK;
const LABEL_BACKGROUND: Color32 = Color32::WHITE;
const LABEL_FONT_SIZE: f32 = 14.;

/// canvas
impl App {
    /// Keeps the texture in step with the session's displayed image.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let generation = self.session.generation();

        if matches!(&self.texture, Some((g, _)) if *g == generation) {
            return;
        }

        let Some(img) = self.session.displayed() else {
            self.texture = None;
            return;
        };

        let image = color_image(img);

        if let Some((g, handle)) = &mut self.texture {
            handle.set(image, egui::TextureOptions::NEAREST);
            *g = generation;
            return;
        }

        let handle = ctx.load_texture("labeling_image", image, egui::TextureOptions::NEAREST);
        self.texture = Some((generation, handle));
    }

    /// Draws the image and overlays, pushes pointer events for this frame.
    pub fn labeling_canvas(&mut self, ui: &mut egui::Ui, events: &mut Vec<SessionEvent>) {
        self.sync_texture(ui.ctx());

        let Some((_, texture)) = &self.texture else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new("No more images. Use Previous to go back, or close the window.")
                        .size(16.),
                );
            });
            return;
        };

        let Some(img) = self.session.displayed() else {
            return;
        };

        let size = Vec2::new(img.width() as f32, img.height() as f32);

        let image = egui::Image::from_texture((texture.id(), size))
            .fit_to_exact_size(size)
            .max_size(size)
            .sense(Sense::click());

        let resp = ui.add(image);
        let rect = resp.rect;

        if let Some(pos) = resp.hover_pos() {
            let pos = to_canvas(rect, pos);
            if pos != self.session.crosshair().pos {
                events.push(SessionEvent::PointerMove(pos));
            }
        }

        /// fires on release
        if resp.clicked() {
            if let Some(pos) = resp.interact_pointer_pos() {
                events.push(SessionEvent::PointerClick(to_canvas(rect, pos)));
            }
        }

        self.paint_overlays(ui, rect);
    }

    fn paint_overlays(&self, ui: &egui::Ui, rect: Rect) {
        let painter = ui.painter_at(rect);

        let stroke = Stroke::new(1.0, CROSSHAIR_COLOR);
        let c = to_screen(rect, self.session.crosshair().pos);
        painter.hline(rect.x_range(), c.y, stroke);
        painter.vline(c.x, rect.y_range(), stroke);

        let Some(marker) = self.session.marker() else {
            return;
        };

        painter.circle_filled(to_screen(rect, marker.display), marker.radius, MARKER_COLOR);

        let galley = painter.layout_no_wrap(
            marker.label(),
            FontId::proportional(LABEL_FONT_SIZE),
            LABEL_COLOR,
        );
        let anchor = to_screen(rect, marker.label_anchor());

        /// background first so the text stays on top
        let background = Rect::from_min_size(anchor, galley.size());
        painter.rect_filled(background, 0.0, LABEL_BACKGROUND);
        painter.galley(anchor, galley, LABEL_COLOR);
    }
}
