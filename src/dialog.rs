use std::path::PathBuf;

use tracing::{debug, error, info, trace, warn};

/// Blocking multi-select picker. Empty when cancelled.
pub fn pick_images(extensions: &[String]) -> Vec<PathBuf> {
    let files = rfd::FileDialog::new()
        .set_title("Select Images")
        .add_filter("Image files", extensions)
        .pick_files()
        .unwrap_or_default();

    debug!("Selected {} files", files.len());
    files
}
