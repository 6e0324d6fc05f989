pub mod overlay;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use egui::Pos2;

use crate::{
    image_source::{ImageSource, ScaledImage},
    output::{PointRow, RowSink},
};

use self::overlay::{Crosshair, Marker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub scale: f64,
    pub marker_radius: f32,
    pub label_offset: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            marker_radius: 5.0,
            label_offset: 10.0,
        }
    }
}

impl From<&crate::appconfig::AppSettings> for SessionOptions {
    fn from(settings: &crate::appconfig::AppSettings) -> Self {
        Self {
            scale: settings.scale,
            marker_radius: settings.marker_radius,
            label_offset: settings.label_offset,
        }
    }
}

/// Everything the window can ask the session to do, in delivery order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    PointerMove(Pos2),
    PointerClick(Pos2),
    /// "Next" or Ctrl+S
    Advance,
    /// "Previous"
    Retreat,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// index of the newly displayed image
    Loaded(usize),
    Unchanged,
    /// moved past the last image, nothing is displayed
    Exhausted,
}

/// Labeling session over a fixed list of images.
///
/// Owns the output sink for its whole lifetime. The sink is closed by
/// [`Session::end`], or on drop if `end` was never reached.
pub struct Session<I: ImageSource, W: RowSink> {
    image_paths: Vec<PathBuf>,
    current_index: usize,
    options: SessionOptions,

    /// source image coordinates of the last click on the current image
    pending: Option<(f64, f64)>,

    crosshair: Crosshair,
    marker: Option<Marker>,

    displayed: Option<ScaledImage>,
    /// bumped whenever `displayed` changes
    generation: u64,

    images: I,
    sink: Option<W>,
}

/// start
impl<I: ImageSource, W: RowSink> Session<I, W> {
    /// Opens the sink, then loads the first image.
    pub fn start<F>(
        image_paths: Vec<PathBuf>,
        options: SessionOptions,
        images: I,
        open_sink: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<W>,
    {
        ensure!(!image_paths.is_empty(), "No images to label");
        ensure!(
            options.scale.is_finite() && options.scale > 0.,
            "Scale must be positive, got {}",
            options.scale
        );

        let sink = open_sink()?;

        let mut out = Self {
            image_paths,
            current_index: 0,
            options,
            pending: None,
            crosshair: Crosshair::default(),
            marker: None,
            displayed: None,
            generation: 0,
            images,
            sink: Some(sink),
        };

        info!(
            "Starting session with {} images at scale {}",
            out.image_paths.len(),
            out.options.scale
        );

        /// on failure `out` is dropped here, which closes the sink
        let img = out.load_image(0)?;
        out.show(0, img);

        Ok(out)
    }
}

/// events
impl<I: ImageSource, W: RowSink> Session<I, W> {
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<NavOutcome> {
        match event {
            SessionEvent::PointerMove(pos) => {
                self.on_pointer_move(pos);
                Ok(NavOutcome::Unchanged)
            }
            SessionEvent::PointerClick(pos) => {
                self.on_pointer_click(pos);
                Ok(NavOutcome::Unchanged)
            }
            SessionEvent::Advance => self.advance(),
            SessionEvent::Retreat => self.retreat(),
            SessionEvent::Close => {
                self.end()?;
                Ok(NavOutcome::Unchanged)
            }
        }
    }

    pub fn on_pointer_move(&mut self, pos: Pos2) {
        self.crosshair.pos = pos;
    }

    /// Replaces any previous marker on this image.
    pub fn on_pointer_click(&mut self, pos: Pos2) {
        if self.displayed.is_none() {
            trace!("click with no image displayed, ignoring");
            return;
        }

        let source = (
            pos.x as f64 / self.options.scale,
            pos.y as f64 / self.options.scale,
        );

        debug!(
            "click at ({:.1}, {:.1}) -> ({:.2}, {:.2})",
            pos.x, pos.y, source.0, source.1
        );

        self.marker = Some(Marker {
            display: pos,
            source,
            radius: self.options.marker_radius,
            label_offset: self.options.label_offset,
        });
        self.pending = Some(source);
    }

    /// Saves the pending point for the current image, then moves forward.
    pub fn advance(&mut self) -> Result<NavOutcome> {
        if self.is_exhausted() {
            debug!("advance past the end, nothing to do");
            return Ok(NavOutcome::Exhausted);
        }

        if let Some((x, y)) = self.pending {
            let row = PointRow {
                path: row_path(&self.image_paths[self.current_index]),
                x,
                y,
            };
            let Some(sink) = self.sink.as_mut() else {
                bail!("Session already ended, cannot save {}", row.path);
            };
            sink.write_row(&row)?;
            info!("Saved {} ({:.2}, {:.2})", row.path, x, y);
        }

        /// pending belongs to the image being left
        self.clear_marker();

        let next = self.current_index + 1;

        if next < self.image_paths.len() {
            let img = self.load_image(next)?;
            self.show(next, img);
            Ok(NavOutcome::Loaded(next))
        } else {
            self.current_index = next;
            self.displayed = None;
            self.generation += 1;
            if let Some(sink) = self.sink.as_mut() {
                sink.flush()?;
            }
            info!("All {} images done", self.image_paths.len());
            Ok(NavOutcome::Exhausted)
        }
    }

    /// Moves back one image. Never saves, the pending point is discarded.
    pub fn retreat(&mut self) -> Result<NavOutcome> {
        if self.current_index == 0 {
            return Ok(NavOutcome::Unchanged);
        }

        if self.pending.is_some() {
            debug!("discarding unsaved point on {}", self.current_index);
        }

        let prev = self.current_index - 1;
        let img = self.load_image(prev)?;
        self.show(prev, img);
        Ok(NavOutcome::Loaded(prev))
    }

    /// Close the sink. Calling again is a no-op.
    pub fn end(&mut self) -> Result<()> {
        match self.sink.take() {
            Some(sink) => {
                sink.close()?;
                info!("Session ended");
            }
            None => {
                debug!("Session already ended");
            }
        }
        Ok(())
    }
}

/// internal
impl<I: ImageSource, W: RowSink> Session<I, W> {
    /// Decodes without touching session state.
    fn load_image(&mut self, index: usize) -> Result<ScaledImage> {
        let path = &self.image_paths[index];
        let img = self.images.load(path, self.options.scale)?;

        info!(
            "Loaded [{}/{}] {}: {}x{} -> {}x{}",
            index + 1,
            self.image_paths.len(),
            path.display(),
            img.source_size[0],
            img.source_size[1],
            img.width(),
            img.height()
        );

        Ok(img)
    }

    fn show(&mut self, index: usize, img: ScaledImage) {
        self.current_index = index;
        self.displayed = Some(img);
        self.generation += 1;
        self.clear_marker();
    }

    fn clear_marker(&mut self) {
        self.marker = None;
        self.pending = None;
    }
}

/// getters
impl<I: ImageSource, W: RowSink> Session<I, W> {
    pub fn len(&self) -> usize {
        self.image_paths.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.image_paths.get(self.current_index).map(|p| p.as_path())
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.image_paths.len()
    }

    pub fn is_ended(&self) -> bool {
        self.sink.is_none()
    }

    pub fn pending(&self) -> Option<(f64, f64)> {
        self.pending
    }

    pub fn crosshair(&self) -> Crosshair {
        self.crosshair
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn displayed(&self) -> Option<&ScaledImage> {
        self.displayed.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Output table text for a path, non-UTF-8 parts are replaced.
fn row_path(path: &Path) -> String {
    match path.to_str() {
        Some(s) => s.to_string(),
        None => {
            let lossy = path.to_string_lossy().into_owned();
            warn!("Path is not valid UTF-8, saving as {}", lossy);
            lossy
        }
    }
}

impl<I: ImageSource, W: RowSink> Drop for Session<I, W> {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            error!("Failed to close output: {:#}", e);
        }
    }
}
