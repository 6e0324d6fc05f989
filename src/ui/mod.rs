pub mod data_labeling;
pub mod ui_types;
pub mod utils;

use ui_types::*;

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use egui::{Align, Key, Layout, Modifiers, RichText, Vec2};

use crate::session::{NavOutcome, SessionEvent};

/// Used for the first frame, replaced by the measured height afterwards.
pub const NAV_BAR_HEIGHT: f32 = 32.;

/// New
impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, session: LabelSession, fatal: FatalSlot) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        Self {
            session,
            texture: None,
            sized_for: 0,
            nav_bar_height: NAV_BAR_HEIGHT,
            fatal,
        }
    }
}

/// controls
impl App {
    fn nav_bar(&mut self, ui: &mut egui::Ui, events: &mut Vec<SessionEvent>) {
        ui.horizontal(|ui| {
            if ui.button(RichText::new("Previous").size(14.)).clicked() {
                events.push(SessionEvent::Retreat);
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let next = ui.add_enabled(
                    !self.session.is_exhausted(),
                    egui::Button::new(RichText::new("Next").size(14.)),
                );
                if next.clicked() {
                    events.push(SessionEvent::Advance);
                }

                let status = match self.session.current_path() {
                    Some(path) => format!(
                        "[{}/{}] {}",
                        self.session.current_index() + 1,
                        self.session.len(),
                        path.display()
                    ),
                    None => format!("[done/{}]", self.session.len()),
                };

                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    ui.add(egui::Label::new(RichText::new(status).monospace()).truncate());
                });
            });
        });
    }

    fn keyboard(&mut self, ctx: &egui::Context, events: &mut Vec<SessionEvent>) {
        if ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::S)) {
            events.push(SessionEvent::Advance);
        }

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            events.push(SessionEvent::Close);
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        } else if ctx.input(|i| i.viewport().close_requested()) {
            events.push(SessionEvent::Close);
        }
    }

    /// Resize the window around a newly displayed image.
    fn fit_window(&mut self, ctx: &egui::Context) {
        let generation = self.session.generation();
        if self.sized_for == generation {
            return;
        }
        self.sized_for = generation;

        if let Some(img) = self.session.displayed() {
            let size = Vec2::new(img.width() as f32, img.height() as f32 + self.nav_bar_height);
            debug!("resizing window to {:?}", size);
            ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(size));
        }
    }

    fn dispatch_all(&mut self, ctx: &egui::Context, events: Vec<SessionEvent>) {
        if events.is_empty() {
            return;
        }

        for event in events {
            if self.session.is_ended() {
                break;
            }

            match self.session.dispatch(event) {
                Ok(NavOutcome::Exhausted) => {
                    info!("No more images");
                }
                Ok(_) => {}
                Err(e) => {
                    self.fail(ctx, e);
                    break;
                }
            }
        }

        ctx.request_repaint();
    }

    /// Ends the session and closes the window, `main` reports the error.
    fn fail(&mut self, ctx: &egui::Context, e: anyhow::Error) {
        error!("Session failed: {:#}", e);

        if let Err(e) = self.session.end() {
            error!("Failed to close output: {:#}", e);
        }

        match self.fatal.lock() {
            Ok(mut slot) => *slot = Some(format!("{:#}", e)),
            Err(_) => error!("Fatal error slot poisoned"),
        }

        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

/// Orders one frame's events: canvas pointer events, then buttons, then keys.
///
/// A click always happens before a button or shortcut in the same frame can
/// act on it, so Next or Ctrl+S saves that click.
pub fn frame_events(
    pointer: Vec<SessionEvent>,
    nav: Vec<SessionEvent>,
    keys: Vec<SessionEvent>,
) -> Vec<SessionEvent> {
    pointer.into_iter().chain(nav).chain(keys).collect()
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut keys = vec![];
        self.keyboard(ctx, &mut keys);

        let mut nav = vec![];
        let bar = egui::TopBottomPanel::top("nav").show(ctx, |ui| {
            self.nav_bar(ui, &mut nav);
        });
        self.nav_bar_height = bar.response.rect.height();

        let mut pointer = vec![];
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.labeling_canvas(ui, &mut pointer);
            });

        self.dispatch_all(ctx, frame_events(pointer, nav, keys));
        self.fit_window(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use egui::Pos2;

    #[test]
    fn click_dispatched_before_advance_in_same_frame() {
        let events = frame_events(
            vec![
                SessionEvent::PointerMove(Pos2::new(1., 2.)),
                SessionEvent::PointerClick(Pos2::new(1., 2.)),
            ],
            vec![SessionEvent::Advance],
            vec![SessionEvent::Advance, SessionEvent::Close],
        );

        assert_eq!(
            events,
            vec![
                SessionEvent::PointerMove(Pos2::new(1., 2.)),
                SessionEvent::PointerClick(Pos2::new(1., 2.)),
                SessionEvent::Advance,
                SessionEvent::Advance,
                SessionEvent::Close,
            ]
        );
    }
}
