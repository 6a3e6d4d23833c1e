use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::{debug, info, instrument};

use crate::error::ViewerError;
use crate::{document_id_for_path, DocumentInfo, DocumentProvider, PageRenderer, RenderImage};

pub const MIN_ZOOM_PERCENT: u32 = 25;
pub const MAX_ZOOM_PERCENT: u32 = 500;

pub fn clamp_zoom(percent: i64) -> u32 {
    percent.clamp(i64::from(MIN_ZOOM_PERCENT), i64::from(MAX_ZOOM_PERCENT)) as u32
}

/// The currently opened document together with its view position.
pub struct DocumentSession {
    info: DocumentInfo,
    renderer: Box<dyn PageRenderer>,
    current_page: usize,
    zoom_percent: u32,
}

impl DocumentSession {
    #[instrument(skip(provider))]
    pub fn open(
        provider: &dyn DocumentProvider,
        path: &Path,
        zoom_percent: u32,
    ) -> Result<Self, ViewerError> {
        let renderer = provider
            .open(path)
            .map_err(|err| ViewerError::open(path, &err))?;
        let page_count = renderer.page_count();
        if page_count == 0 {
            return Err(ViewerError::open(path, &anyhow!("document has no pages")));
        }
        let info = DocumentInfo {
            id: document_id_for_path(path),
            path: path.to_path_buf(),
            page_count,
        };
        info!(id = %info.id, page_count, "document opened");
        Ok(Self::new(info, renderer, zoom_percent))
    }

    pub(crate) fn new(info: DocumentInfo, renderer: Box<dyn PageRenderer>, zoom_percent: u32) -> Self {
        Self {
            info,
            renderer,
            current_page: 0,
            zoom_percent: clamp_zoom(i64::from(zoom_percent)),
        }
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn renderer(&self) -> &dyn PageRenderer {
        self.renderer.as_ref()
    }

    pub fn page_count(&self) -> usize {
        self.info.page_count
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn zoom_percent(&self) -> u32 {
        self.zoom_percent
    }

    pub fn zoom_factor(&self) -> f32 {
        self.zoom_percent as f32 / 100.0
    }

    pub fn render_current(&self) -> Result<RenderImage> {
        self.renderer.render(self.current_page, self.zoom_factor())
    }

    /// Clamps `percent` into the supported range and re-renders the current page.
    /// The zoom is left unchanged when that render fails.
    pub fn set_zoom(&mut self, percent: i64) -> Result<(u32, RenderImage)> {
        let zoom_percent = clamp_zoom(percent);
        let image = self
            .renderer
            .render(self.current_page, zoom_percent as f32 / 100.0)?;
        self.zoom_percent = zoom_percent;
        debug!(zoom = zoom_percent, "zoom changed");
        Ok((zoom_percent, image))
    }

    /// Returns `None` without touching state when `page_index` is out of range.
    pub fn go_to(&mut self, page_index: usize) -> Result<Option<RenderImage>> {
        if page_index >= self.info.page_count {
            return Ok(None);
        }
        let image = self.renderer.render(page_index, self.zoom_factor())?;
        self.current_page = page_index;
        debug!(page = page_index, "page shown");
        Ok(Some(image))
    }

    pub fn next(&mut self) -> Result<Option<RenderImage>> {
        if self.current_page + 1 >= self.info.page_count {
            return Ok(None);
        }
        self.go_to(self.current_page + 1)
    }

    pub fn previous(&mut self) -> Result<Option<RenderImage>> {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to(page),
            None => Ok(None),
        }
    }

    pub fn last_page(&self) -> usize {
        self.info.page_count - 1
    }
}
