use std::{
    fs::File,
    sync::{Arc, Mutex},
};

use crate::{image_source::FileImageSource, output::CsvSink, session::Session};

pub type LabelSession = Session<FileImageSource, CsvSink<File>>;

/// Set by the UI when the session dies, read by `main` after the window closes.
pub type FatalSlot = Arc<Mutex<Option<String>>>;

pub struct App {
    pub session: LabelSession,

    /// session generation the texture was uploaded from
    pub texture: Option<(u64, egui::TextureHandle)>,

    /// generation the window was last resized for
    pub sized_for: u64,

    /// measured each frame, used to fit the window around the canvas
    pub nav_bar_height: f32,

    pub fatal: FatalSlot,
}
