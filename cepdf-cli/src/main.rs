use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use cepdf_core::{Command, Viewer, ViewerConfig, ViewerEvent};
use cepdf_render::PdfiumRenderFactory;
use cepdf_tty::{
    write_status_line, DrawParams, EventMapper, InputMode, KittyRenderer, PointerKind, UiEvent,
};
use clap::Parser;
use crossterm::cursor;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use directories::ProjectDirs;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

mod layout;

use layout::{
    crop_render_image, fill_rect, page_rect_to_pixels, place_image, screen_rect_to_image,
    ScreenLayout, Viewport,
};

const SEARCH_HIGHLIGHT: [u8; 3] = [255, 235, 0];
const MEASURE_HIGHLIGHT: [u8; 3] = [0, 120, 255];
const EMPTY_MESSAGE: &str = "No document open. Press 'o' to open a PDF, 'q' to quit.";

#[derive(Debug, Parser)]
#[command(name = "cepdf", version, about = "CE PDF Viewer for kitty-compatible terminals")]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Page to show after opening FILE (1-based)
    #[arg(short = 'p', long = "page", requires = "file")]
    page: Option<usize>,

    /// PDF file to open on start
    file: Option<PathBuf>,
}

struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnableMouseCapture, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = crossterm::execute!(stdout, DisableMouseCapture, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let project_dirs = ProjectDirs::from("net", "cepdf", "cepdf")
        .ok_or_else(|| anyhow!("unable to resolve platform data directories"))?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| project_dirs.config_dir().join("config.toml"));
    let config = ViewerConfig::load(&config_path)?;
    let _log_guard = init_logging(&project_dirs, &config.log_filter)?;
    info!(config = %config_path.display(), "starting cepdf");

    let provider = PdfiumRenderFactory::new(config.pdfium_library.as_deref())?;
    let mut viewer = Viewer::new(Box::new(provider), config);
    let mut mapper = EventMapper::with_zoom_step(viewer.config().zoom_step);

    if let Some(file) = args.file {
        apply_command(&mut viewer, Command::OpenDocument { path: file });
        if let Some(page) = args.page {
            apply_command(
                &mut viewer,
                Command::GotoPage {
                    page: page.saturating_sub(1),
                },
            );
        }
        viewer.drain_events();
    }

    let _terminal = TerminalGuard::new()?;
    let mut renderer = KittyRenderer::new(io::stdout());
    let mut viewport = Viewport::default();
    let mut dirty = true;

    loop {
        if dirty {
            redraw(&mut renderer, &viewer, &mapper, viewport)?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(100))? {
            let ui_event = mapper.map_event(event::read()?);
            match handle_event(ui_event, &mut viewer, &mut mapper, &mut viewport)? {
                LoopAction::ContinueRedraw => dirty = true,
                LoopAction::StatusOnly => draw_status_line(&mut renderer, &viewer, &mapper)?,
                LoopAction::Continue => {}
                LoopAction::Quit => break,
            }
        }
    }

    renderer.delete_images()?;
    renderer.clear_all()?;
    Ok(())
}

enum LoopAction {
    Continue,
    StatusOnly,
    ContinueRedraw,
    Quit,
}

fn handle_event(
    event: UiEvent,
    viewer: &mut Viewer,
    mapper: &mut EventMapper,
    viewport: &mut Viewport,
) -> Result<LoopAction> {
    let action = match event {
        UiEvent::Command(command) => {
            apply_command(viewer, command);
            LoopAction::Continue
        }
        UiEvent::BeginSearch | UiEvent::PromptChanged => LoopAction::StatusOnly,
        UiEvent::SearchCancel => {
            apply_command(
                viewer,
                Command::SetSearchText {
                    text: String::new(),
                },
            );
            LoopAction::StatusOnly
        }
        UiEvent::SearchQueryChanged { query } => {
            apply_command(viewer, Command::SetSearchText { text: query });
            LoopAction::StatusOnly
        }
        UiEvent::SearchSubmit { query } => {
            apply_command(viewer, Command::SetSearchText { text: query });
            apply_command(viewer, Command::SearchNext);
            LoopAction::StatusOnly
        }
        UiEvent::BeginPrompt { kind } => {
            if kind.requires_document() && !viewer.has_document() {
                mapper.set_mode(InputMode::Normal);
                if let Some(command) = kind.cancelled_command() {
                    apply_command(viewer, command);
                }
            }
            LoopAction::StatusOnly
        }
        UiEvent::PromptSubmit { kind, input } => {
            if let Some(command) = kind.submit_command(&input) {
                apply_command(viewer, command);
            }
            LoopAction::StatusOnly
        }
        UiEvent::PromptCancel { kind } => {
            if let Some(command) = kind.cancelled_command() {
                apply_command(viewer, command);
            }
            LoopAction::StatusOnly
        }
        UiEvent::Pointer { kind, column, row } => {
            if !viewer.measure_mode() {
                return Ok(LoopAction::Continue);
            }
            let layout = ScreenLayout::from_window(&terminal::window_size()?);
            let point = layout.cell_to_pixel(column, row);
            let command = match kind {
                PointerKind::Press => Command::PointerPress { point },
                PointerKind::Move => Command::PointerMove { point },
                PointerKind::Release => Command::PointerRelease,
            };
            apply_command(viewer, command);
            // The rubber band is drawn onto the page image.
            LoopAction::ContinueRedraw
        }
        UiEvent::Pan { delta_x, delta_y } => {
            if viewer.has_document() && viewport.adjust(delta_x, delta_y) {
                LoopAction::ContinueRedraw
            } else {
                LoopAction::Continue
            }
        }
        UiEvent::Quit => return Ok(LoopAction::Quit),
        UiEvent::None => LoopAction::Continue,
    };

    Ok(merge_viewer_events(action, viewer.drain_events(), viewport))
}

/// Failed actions never end the session; they surface on the status line.
fn apply_command(viewer: &mut Viewer, command: Command) {
    if let Err(err) = viewer.apply(command) {
        warn!(?err, "command failed");
        viewer.set_status(format!("{err:#}"));
    }
}

fn merge_viewer_events(
    action: LoopAction,
    events: Vec<ViewerEvent>,
    viewport: &mut Viewport,
) -> LoopAction {
    let mut result = action;
    for event in events {
        match event {
            ViewerEvent::DocumentOpened(_) => {
                *viewport = Viewport::default();
                result = LoopAction::ContinueRedraw;
            }
            ViewerEvent::PageRendered { .. } => result = LoopAction::ContinueRedraw,
            ViewerEvent::StatusChanged | ViewerEvent::MeasurementReported(_) => {
                if matches!(result, LoopAction::Continue) {
                    result = LoopAction::StatusOnly;
                }
            }
        }
    }
    result
}

fn redraw(
    renderer: &mut KittyRenderer<io::Stdout>,
    viewer: &Viewer,
    mapper: &EventMapper,
    viewport: Viewport,
) -> Result<()> {
    let layout = ScreenLayout::from_window(&terminal::window_size()?);

    renderer.begin_sync_update()?;
    renderer.clear_all()?;

    match (viewer.session(), viewer.page_view()) {
        (Some(session), Some(page)) => {
            let mut image = page.clone();
            if let Some(hit) = viewer.current_hit_on_page() {
                if let Some(rect) = page_rect_to_pixels(hit.scaled(session.zoom_factor()), &image) {
                    fill_rect(&mut image, rect, SEARCH_HIGHLIGHT, 0.35);
                }
            }

            let placement = place_image(&image, &layout, viewport);
            if placement.needs_crop(&image) {
                image = crop_render_image(
                    &image,
                    placement.crop_x,
                    placement.crop_y,
                    placement.crop_width,
                    placement.crop_height,
                );
            }

            if let Some(band) = viewer.measure_rect() {
                if let Some(rect) = screen_rect_to_image(band, &placement, &layout, &image) {
                    fill_rect(&mut image, rect, MEASURE_HIGHLIGHT, 0.25);
                }
            }

            {
                let writer = renderer.writer();
                crossterm::queue!(
                    writer,
                    cursor::MoveTo(placement.start_col as u16, placement.start_row as u16)
                )?;
            }
            renderer.draw(
                &image,
                DrawParams::clamped(placement.columns, placement.rows),
            )?;
        }
        _ => {
            renderer.delete_images()?;
            let row = (layout.image_rows() / 2) as u16;
            let col = (layout.total_cols as usize).saturating_sub(EMPTY_MESSAGE.len()) / 2;
            let writer = renderer.writer();
            crossterm::queue!(writer, cursor::MoveTo(col as u16, row), Print(EMPTY_MESSAGE))?;
        }
    }

    draw_status_line(renderer, viewer, mapper)?;
    renderer.end_sync_update()?;
    Ok(())
}

fn draw_status_line(
    renderer: &mut KittyRenderer<io::Stdout>,
    viewer: &Viewer,
    mapper: &EventMapper,
) -> Result<()> {
    let window = terminal::window_size()?;
    let total_cols = usize::from(window.columns).max(1);
    let status_row = window.rows.saturating_sub(1);
    let status = status_text(viewer, mapper.pending_input().as_deref());
    let line: String = status.chars().take(total_cols).collect();

    let writer = renderer.writer();
    crossterm::execute!(
        writer,
        cursor::MoveTo(0, status_row),
        Clear(ClearType::CurrentLine)
    )?;
    write_status_line(writer, &line)?;
    Ok(())
}

fn status_text(viewer: &Viewer, pending_input: Option<&str>) -> String {
    if let Some(pending) = pending_input.filter(|s| !s.is_empty()) {
        return pending.to_string();
    }

    let mut parts = Vec::new();
    if let Some(session) = viewer.session() {
        parts.push(format!(
            "{} | page {} of {} | {}%",
            file_label(&session.info().path),
            session.current_page() + 1,
            session.page_count(),
            session.zoom_percent()
        ));
        let search = viewer.search();
        if let Some(query) = search.query_text() {
            let position = search.cursor_position();
            let total = search.hits().len();
            parts.push(format!("/{} ({}/{})", query, position + 1, total));
        }
        if viewer.measure_mode() {
            parts.push("measure".to_string());
        }
    }
    if let Some(message) = viewer.status() {
        parts.push(message.to_string());
    }
    parts.join(" | ")
}

fn file_label(path: &Path) -> &str {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("<unknown>")
}

fn init_logging(project_dirs: &ProjectDirs, default_filter: &str) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "cepdf.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // The terminal belongs to the UI, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    use cepdf_core::{DocumentProvider, PageRect, PageRenderer, RenderImage};

    struct StubRenderer;

    impl PageRenderer for StubRenderer {
        fn page_count(&self) -> usize {
            4
        }

        fn render(&self, _page_index: usize, _zoom_factor: f32) -> Result<RenderImage> {
            Ok(RenderImage {
                width: 2,
                height: 2,
                pixels: vec![255; 12],
            })
        }

        fn search(&self, page_index: usize, _literal: &str) -> Result<Vec<PageRect>> {
            Ok(if page_index == 2 {
                vec![PageRect::new(0.0, 0.0, 1.0, 1.0)]
            } else {
                Vec::new()
            })
        }
    }

    struct StubProvider;

    impl DocumentProvider for StubProvider {
        fn open(&self, _path: &Path) -> Result<Box<dyn PageRenderer>> {
            Ok(Box::new(StubRenderer))
        }
    }

    fn viewer() -> Viewer {
        Viewer::new(Box::new(StubProvider), ViewerConfig::default())
    }

    #[test]
    fn empty_state_status_shows_only_messages() {
        let mut viewer = viewer();
        assert_eq!(status_text(&viewer, None), "");
        apply_command(&mut viewer, Command::NextPage);
        assert_eq!(status_text(&viewer, None), "Please open a PDF first");
    }

    #[test]
    fn document_status_includes_page_zoom_and_search() {
        let mut viewer = viewer();
        apply_command(
            &mut viewer,
            Command::OpenDocument {
                path: PathBuf::from("/tmp/report.pdf"),
            },
        );
        apply_command(
            &mut viewer,
            Command::SetSearchText {
                text: "total".to_string(),
            },
        );
        apply_command(&mut viewer, Command::SearchNext);

        assert_eq!(
            status_text(&viewer, None),
            "report.pdf | page 3 of 4 | 100% | /total (1/1)"
        );
        assert_eq!(status_text(&viewer, Some("/tot")), "/tot");
    }

    #[test]
    fn viewer_events_promote_loop_action() {
        let mut viewport = Viewport { x: 0.5, y: 0.5 };
        let action = merge_viewer_events(
            LoopAction::Continue,
            vec![ViewerEvent::StatusChanged],
            &mut viewport,
        );
        assert!(matches!(action, LoopAction::StatusOnly));

        let action = merge_viewer_events(
            LoopAction::StatusOnly,
            vec![ViewerEvent::PageRendered {
                page: 1,
                zoom_percent: 100,
            }],
            &mut viewport,
        );
        assert!(matches!(action, LoopAction::ContinueRedraw));
        assert_eq!(viewport, Viewport { x: 0.5, y: 0.5 });

        let opened = cepdf_core::document_id_for_path(Path::new("/tmp/report.pdf"));
        let action = merge_viewer_events(
            LoopAction::Continue,
            vec![ViewerEvent::DocumentOpened(opened)],
            &mut viewport,
        );
        assert!(matches!(action, LoopAction::ContinueRedraw));
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn cancelled_search_text_is_not_reused() {
        let mut viewer = viewer();
        let mut mapper = EventMapper::new();
        let mut viewport = Viewport::default();
        apply_command(
            &mut viewer,
            Command::OpenDocument {
                path: PathBuf::from("/tmp/report.pdf"),
            },
        );

        for event in [
            UiEvent::SearchQueryChanged {
                query: "total".to_string(),
            },
            UiEvent::SearchCancel,
            UiEvent::Command(Command::SearchNext),
        ] {
            handle_event(event, &mut viewer, &mut mapper, &mut viewport).unwrap();
        }

        assert_eq!(viewer.search_text(), "");
        assert!(viewer.search().query_text().is_none());
        assert_eq!(viewer.session().unwrap().current_page(), 0);
    }

    #[test]
    fn pan_without_document_does_nothing() {
        let mut viewer = viewer();
        let mut mapper = EventMapper::new();
        let mut viewport = Viewport::default();
        let action = handle_event(
            UiEvent::Pan {
                delta_x: 0.1,
                delta_y: 0.0,
            },
            &mut viewer,
            &mut mapper,
            &mut viewport,
        )
        .unwrap();
        assert!(matches!(action, LoopAction::Continue));
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn comment_prompt_without_document_is_refused() {
        let mut viewer = viewer();
        let mut mapper = EventMapper::new();
        let mut viewport = Viewport::default();
        mapper.set_mode(InputMode::Prompt(cepdf_tty::PromptKind::Comment));

        let action = handle_event(
            UiEvent::BeginPrompt {
                kind: cepdf_tty::PromptKind::Comment,
            },
            &mut viewer,
            &mut mapper,
            &mut viewport,
        )
        .unwrap();

        assert!(matches!(action, LoopAction::StatusOnly));
        assert_eq!(mapper.mode(), InputMode::Normal);
        assert_eq!(viewer.status(), Some("Please open a PDF first"));
    }
}
