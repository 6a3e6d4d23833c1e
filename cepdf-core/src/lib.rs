use std::path::{Path, PathBuf};

use anyhow::Result;
use once_cell::sync::Lazy;
use uuid::Uuid;

mod config;
mod error;
mod feature;
mod measure;
mod search;
mod session;
mod viewer;

pub use config::{ViewerConfig, DEFAULT_ZOOM_STEP};
pub use error::ViewerError;
pub use feature::FeatureAction;
pub use measure::{Measurement, MeasurementOverlay, Point, ScreenRect};
pub use search::{SearchHit, SearchIndex};
pub use session::{clamp_zoom, DocumentSession, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT};
pub use viewer::{Command, Viewer, ViewerEvent, NO_DOCUMENT_MESSAGE};

pub type DocumentId = Uuid;

static DOCUMENT_NAMESPACE: Lazy<Uuid> = Lazy::new(|| {
    Uuid::parse_str("3f0e4c1a-6b2d-5e7f-9a8c-1d2e3f4a5b6c").expect("valid namespace UUID")
});

pub fn document_id_for_path(path: &Path) -> DocumentId {
    let resolved = path
        .canonicalize()
        .or_else(|_| {
            if path.is_absolute() {
                Ok(path.to_path_buf())
            } else {
                std::env::current_dir().map(|cwd| cwd.join(path))
            }
        })
        .unwrap_or_else(|_| path.to_path_buf());
    let rendered = resolved.to_string_lossy();
    Uuid::new_v5(&DOCUMENT_NAMESPACE, rendered.as_bytes())
}

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub path: PathBuf,
    pub page_count: usize,
}

/// Rasterized page, tightly packed RGB rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RenderImage {
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Region on a page in PDF points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PageRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
            && self.right > self.left
            && self.bottom > self.top
    }

    /// Scales the rectangle into pixel space of a page rendered at `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            left: self.left * factor,
            top: self.top * factor,
            right: self.right * factor,
            bottom: self.bottom * factor,
        }
    }
}

/// Rendering collaborator bound to one opened document.
pub trait PageRenderer {
    fn page_count(&self) -> usize;
    fn render(&self, page_index: usize, zoom_factor: f32) -> Result<RenderImage>;
    /// Case-sensitive literal matches on a page, in the order the engine reports them.
    fn search(&self, page_index: usize, literal: &str) -> Result<Vec<PageRect>>;
}

pub trait DocumentProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn PageRenderer>>;
}
