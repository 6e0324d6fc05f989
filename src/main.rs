#![allow(unused_imports)]
#![allow(unused_doc_comments)]
// #![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

pub mod appconfig;
pub mod dialog;
pub mod image_source;
pub mod logging;
pub mod output;
pub mod session;
pub mod ui;

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use crate::{
    image_source::FileImageSource,
    output::CsvSink,
    session::{Session, SessionOptions},
    ui::ui_types::{App, FatalSlot},
};

fn main() -> Result<()> {
    let _log_guard = logging::init_logs();

    let settings = appconfig::load_settings(appconfig::CONFIG_FILE);

    let image_paths = dialog::pick_images(&settings.extensions);
    if image_paths.is_empty() {
        info!("File selection cancelled");
        println!("No images selected.");
        return Ok(());
    }

    let output_path = settings.output_path.clone();
    let session = Session::start(
        image_paths,
        SessionOptions::from(&settings),
        FileImageSource::default(),
        || CsvSink::create(&output_path),
    )?;

    info!("Writing points to {}", output_path.display());

    let initial_size = match session.displayed() {
        Some(img) => [
            img.width() as f32,
            img.height() as f32 + ui::NAV_BAR_HEIGHT,
        ],
        None => [800.0, 600.0],
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Image Labeler")
            .with_inner_size(initial_size)
            .with_min_inner_size([300.0, 200.0]),
        ..Default::default()
    };

    let fatal: FatalSlot = Arc::new(Mutex::new(None));
    let app_fatal = fatal.clone();

    eframe::run_native(
        "Image Labeler",
        native_options,
        Box::new(move |cc| Ok(Box::new(App::new(cc, session, app_fatal)))),
    )
    .map_err(|e| anyhow!("Window error: {}", e))?;

    let fatal = fatal.lock().ok().and_then(|mut slot| slot.take());
    if let Some(e) = fatal {
        bail!("Labeling session failed: {}", e);
    }

    info!("Exiting");
    Ok(())
}
