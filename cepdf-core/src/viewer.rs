use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::feature::FeatureAction;
use crate::measure::{Measurement, MeasurementOverlay, Point, ScreenRect};
use crate::search::{SearchHit, SearchIndex};
use crate::session::DocumentSession;
use crate::{DocumentId, DocumentProvider, PageRect, RenderImage};

pub const NO_DOCUMENT_MESSAGE: &str = "Please open a PDF first";

/// Page numbers are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    OpenDocument { path: PathBuf },
    NextPage,
    PrevPage,
    GotoPage { page: usize },
    FirstPage,
    LastPage,
    SetZoom { percent: i64 },
    ZoomBy { delta: i64 },
    ResetZoom,
    SetSearchText { text: String },
    SearchNext,
    SearchPrev,
    ToggleMeasure,
    PointerPress { point: Point },
    PointerMove { point: Point },
    PointerRelease,
    Feature(FeatureAction),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    DocumentOpened(DocumentId),
    PageRendered { page: usize, zoom_percent: u32 },
    StatusChanged,
    MeasurementReported(Measurement),
}

/// Everything the presentation layer shows, driven by [`Command`]s.
pub struct Viewer {
    provider: Box<dyn DocumentProvider>,
    config: ViewerConfig,
    session: Option<DocumentSession>,
    search: SearchIndex,
    search_text: String,
    measure: Option<MeasurementOverlay>,
    page_view: Option<RenderImage>,
    status: Option<String>,
    events: Vec<ViewerEvent>,
}

impl Viewer {
    pub fn new(provider: Box<dyn DocumentProvider>, config: ViewerConfig) -> Self {
        Self {
            provider,
            config,
            session: None,
            search: SearchIndex::new(),
            search_text: String::new(),
            measure: None,
            page_view: None,
            status: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&DocumentSession> {
        self.session.as_ref()
    }

    pub fn has_document(&self) -> bool {
        self.session.is_some()
    }

    pub fn search(&self) -> &SearchIndex {
        &self.search
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn measure_mode(&self) -> bool {
        self.measure.is_some()
    }

    pub fn measure_rect(&self) -> Option<ScreenRect> {
        self.measure.as_ref().and_then(MeasurementOverlay::active_rect)
    }

    pub fn page_view(&self) -> Option<&RenderImage> {
        self.page_view.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The selected search hit when it lies on the page being shown.
    pub fn current_hit_on_page(&self) -> Option<PageRect> {
        let session = self.session.as_ref()?;
        self.search
            .current()
            .filter(|hit| hit.page_index == session.current_page())
            .map(|hit| hit.region)
    }

    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::OpenDocument { path } => self.open(&path),
            Command::NextPage => self.navigate(DocumentSession::next),
            Command::PrevPage => self.navigate(DocumentSession::previous),
            Command::GotoPage { page } => self.navigate(|session| session.go_to(page)),
            Command::FirstPage => self.navigate(|session| session.go_to(0)),
            Command::LastPage => self.navigate(|session| session.go_to(session.last_page())),
            Command::SetZoom { percent } => self.zoom(|_| percent),
            Command::ZoomBy { delta } => {
                self.zoom(|current| i64::from(current).saturating_add(delta))
            }
            Command::ResetZoom => {
                let default_zoom = i64::from(self.config.default_zoom);
                self.zoom(|_| default_zoom)
            }
            Command::SetSearchText { text } => {
                self.search_text = text;
                Ok(())
            }
            Command::SearchNext => self.step_search(true),
            Command::SearchPrev => self.step_search(false),
            Command::ToggleMeasure => {
                self.toggle_measure();
                Ok(())
            }
            Command::PointerPress { point } => {
                if let Some(overlay) = self.measure.as_mut() {
                    overlay.press(point);
                }
                Ok(())
            }
            Command::PointerMove { point } => {
                if let Some(overlay) = self.measure.as_mut() {
                    overlay.move_to(point);
                }
                Ok(())
            }
            Command::PointerRelease => {
                if let Some(measurement) = self.measure.as_mut().and_then(|o| o.release()) {
                    self.set_status(format!(
                        "Measured area: {}x{} pixels",
                        measurement.width, measurement.height
                    ));
                    self.events
                        .push(ViewerEvent::MeasurementReported(measurement));
                }
                Ok(())
            }
            Command::Feature(action) => {
                self.run_feature(action);
                Ok(())
            }
        }
    }

    /// Posts a status message from the presentation layer, e.g. a failed render.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.events.push(ViewerEvent::StatusChanged);
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        let zoom = self
            .session
            .as_ref()
            .map_or(self.config.default_zoom, DocumentSession::zoom_percent);

        let opened = DocumentSession::open(self.provider.as_ref(), path, zoom).and_then(|session| {
            session
                .render_current()
                .map(|image| (session, image))
                .map_err(|err| ViewerError::open(path, &err))
        });

        match opened {
            Ok((session, image)) => {
                let id = session.info().id;
                let zoom_percent = session.zoom_percent();
                info!(%id, path = %path.display(), "showing document");
                self.search.clear();
                if let Some(overlay) = self.measure.as_mut() {
                    *overlay = MeasurementOverlay::new();
                }
                self.session = Some(session);
                self.status = None;
                self.events.push(ViewerEvent::DocumentOpened(id));
                self.show(image, 0, zoom_percent);
            }
            Err(err) => {
                warn!(%err, "open failed");
                let message = match &err {
                    ViewerError::Open { path, reason } => {
                        format!("Failed to open {}: {}", path.display(), reason)
                    }
                    other => other.to_string(),
                };
                self.set_status(message);
            }
        }
        Ok(())
    }

    fn navigate<F>(&mut self, step: F) -> Result<()>
    where
        F: FnOnce(&mut DocumentSession) -> Result<Option<RenderImage>>,
    {
        let Some(session) = self.session.as_mut() else {
            self.report_no_document();
            return Ok(());
        };
        if let Some(image) = step(session)? {
            let page = session.current_page();
            let zoom_percent = session.zoom_percent();
            self.show(image, page, zoom_percent);
        }
        Ok(())
    }

    fn zoom<F>(&mut self, target: F) -> Result<()>
    where
        F: FnOnce(u32) -> i64,
    {
        let Some(session) = self.session.as_mut() else {
            self.report_no_document();
            return Ok(());
        };
        let percent = target(session.zoom_percent());
        let (zoom_percent, image) = session.set_zoom(percent)?;
        let page = session.current_page();
        self.show(image, page, zoom_percent);
        Ok(())
    }

    fn step_search(&mut self, forward: bool) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            self.report_no_document();
            return Ok(());
        };
        if self.search_text.is_empty() {
            return Ok(());
        }
        if self.search.needs_query(&self.search_text) {
            self.search.query(session.renderer(), &self.search_text)?;
        }

        match self.search.advance(forward) {
            Some(SearchHit { page_index, .. }) => {
                debug!(
                    page = page_index,
                    position = self.search.cursor_position(),
                    total = self.search.hits().len(),
                    "search hit selected"
                );
                self.navigate(|session| session.go_to(page_index))
            }
            None => {
                let message = format!("No matches for \"{}\"", self.search_text);
                self.set_status(message);
                Ok(())
            }
        }
    }

    fn toggle_measure(&mut self) {
        if self.session.is_none() {
            self.report_no_document();
            return;
        }
        if self.measure.take().is_some() {
            self.set_status("Measure mode deactivated");
        } else {
            self.measure = Some(MeasurementOverlay::new());
            self.set_status("Measure mode activated - Click and drag to measure");
        }
    }

    fn run_feature(&mut self, action: FeatureAction) {
        if action.requires_document() && self.session.is_none() {
            self.report_no_document();
            return;
        }
        debug!(?action, "feature requested");
        if let Some(message) = action.status_message() {
            self.set_status(message);
        }
    }

    fn show(&mut self, image: RenderImage, page: usize, zoom_percent: u32) {
        self.page_view = Some(image);
        self.events.push(ViewerEvent::PageRendered { page, zoom_percent });
    }

    fn report_no_document(&mut self) {
        self.set_status(ViewerError::NoDocument.to_string());
    }
}
