use std::convert::TryFrom;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cepdf_core::{DocumentProvider, PageRect, PageRenderer, RenderImage};
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use tracing::{debug, instrument, warn};

pub const LIBRARY_PATH_ENV: &str = "CEPDF_PDFIUM_LIBRARY_PATH";

pub struct PdfiumRenderFactory {
    pdfium: Arc<Pdfium>,
}

impl PdfiumRenderFactory {
    /// Binds PDFium from `library` if given, then the environment, the
    /// working directory and finally the system library path.
    pub fn new(library: Option<&Path>) -> Result<Self> {
        let pdfium = match library {
            Some(path) => {
                let bindings = Pdfium::bind_to_library(path).map_err(|err| {
                    anyhow!("failed to load Pdfium from {}: {}", path.display(), err)
                })?;
                Pdfium::new(bindings)
            }
            None => match bind_pdfium_from_env() {
                Some(pdfium) => pdfium,
                None => bind_pdfium_default()?,
            },
        };
        Ok(Self {
            pdfium: Arc::new(pdfium),
        })
    }
}

impl DocumentProvider for PdfiumRenderFactory {
    #[instrument(skip(self))]
    fn open(&self, path: &Path) -> Result<Box<dyn PageRenderer>> {
        let absolute = path
            .canonicalize()
            .with_context(|| format!("failed to resolve path for {:?}", path))?;
        let document = PdfiumDocument::load(Arc::clone(&self.pdfium), absolute)?;
        Ok(Box::new(document))
    }
}

struct PdfiumDocument {
    // Declared before `_pdfium` so it is dropped first.
    document: PdfDocument<'static>,
    _pdfium: Arc<Pdfium>,
    path: PathBuf,
    page_count: usize,
    cache: Mutex<Option<RenderCacheEntry>>,
}

struct RenderCacheEntry {
    page_index: usize,
    zoom_factor: f32,
    image: RenderImage,
}

impl PdfiumDocument {
    fn load(pdfium: Arc<Pdfium>, path: PathBuf) -> Result<Self> {
        let document = pdfium
            .load_pdf_from_file(&path, None)
            .with_context(|| format!("failed to open {:?}", path))?;
        // SAFETY: the document borrows the bindings owned by `pdfium`, which moves into the same
        // struct as `_pdfium`. `document` is declared first and is therefore dropped while the
        // Arc still keeps the bindings alive.
        let document = unsafe { mem::transmute::<PdfDocument<'_>, PdfDocument<'static>>(document) };
        let page_count = usize::try_from(document.pages().len()).unwrap_or_default();
        debug!(path = %path.display(), page_count, "pdfium document loaded");
        Ok(Self {
            document,
            _pdfium: pdfium,
            path,
            page_count,
            cache: Mutex::new(None),
        })
    }

    fn page(&self, page_index: usize) -> Result<PdfPage<'_>> {
        let index: PdfPageIndex = page_index
            .try_into()
            .map_err(|_| anyhow!("page {} is out of supported range", page_index))?;
        self.document
            .pages()
            .get(index)
            .with_context(|| format!("page {} out of range", page_index))
    }

    fn render_internal(&self, page_index: usize, zoom_factor: f32) -> Result<RenderImage> {
        let page = self.page(page_index)?;
        let config = PdfRenderConfig::new().scale_page_by_factor(zoom_factor.max(0.1));
        let bitmap = page
            .render_with_config(&config)
            .with_context(|| format!("failed to render page {}", page_index))?;
        let image = bitmap.as_image().to_rgb8();
        let (width, height) = image.dimensions();

        Ok(RenderImage {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}

impl PageRenderer for PdfiumDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    #[instrument(skip(self))]
    fn render(&self, page_index: usize, zoom_factor: f32) -> Result<RenderImage> {
        {
            let cache = self.cache.lock();
            if let Some(entry) = cache.as_ref() {
                if entry.page_index == page_index
                    && (entry.zoom_factor - zoom_factor).abs() < f32::EPSILON
                {
                    return Ok(entry.image.clone());
                }
            }
        }

        let image = self.render_internal(page_index, zoom_factor)?;

        let mut cache = self.cache.lock();
        *cache = Some(RenderCacheEntry {
            page_index,
            zoom_factor,
            image: image.clone(),
        });

        Ok(image)
    }

    fn search(&self, page_index: usize, literal: &str) -> Result<Vec<PageRect>> {
        if literal.is_empty() {
            return Ok(Vec::new());
        }

        let page = self.page(page_index)?;
        let text = page
            .text()
            .with_context(|| format!("failed to extract text for page {}", page_index))?;

        let options = PdfSearchOptions::new().match_case(true);
        let search = text
            .search(literal, &options)
            .with_context(|| format!("failed to perform search on page {}", page_index))?;

        let page_height = page.height().value;
        if page_height <= 0.0 {
            warn!(
                page = page_index,
                path = %self.path.display(),
                "page has no height, skipping search"
            );
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        while let Some(segments) = search.find_next() {
            for segment in segments.iter() {
                let bounds = segment.bounds();
                // PDF space grows upwards; flip to a top-left origin.
                let rect = PageRect::new(
                    bounds.left().value,
                    page_height - bounds.top().value,
                    bounds.right().value,
                    page_height - bounds.bottom().value,
                );
                if rect.is_valid() {
                    results.push(rect);
                }
            }
        }

        Ok(results)
    }
}

fn bind_pdfium_from_env() -> Option<Pdfium> {
    match std::env::var(LIBRARY_PATH_ENV) {
        Ok(path) if !path.is_empty() => match Pdfium::bind_to_library(&path) {
            Ok(bindings) => Some(Pdfium::new(bindings)),
            Err(err) => {
                warn!(
                    "failed to load Pdfium from {} path {}: {}",
                    LIBRARY_PATH_ENV, path, err
                );
                None
            }
        },
        _ => None,
    }
}

fn bind_pdfium_default() -> Result<Pdfium> {
    let mut errors = Vec::new();

    let cwd_path = Pdfium::pdfium_platform_library_name_at_path("./");

    match Pdfium::bind_to_library(&cwd_path) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(err) => {
            errors.push(format!("{}: {}", cwd_path.display(), err));
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(err) => {
            errors.push(format!("system: {err}"));
            Err(anyhow!(
                "failed to bind to a pdfium library; ensure it is installed ({})",
                errors.join(", ")
            ))
        }
    }
}
