use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cepdf_core::{Command, FeatureAction, RenderImage, DEFAULT_ZOOM_STEP};
use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind},
    terminal::{Clear, ClearType},
};
use png::{BitDepth, ColorType, Encoder};

/// Writes page bitmaps with the kitty graphics protocol.
pub struct KittyRenderer<W: Write> {
    writer: W,
    image_id: u32,
    placement_id: u32,
}

pub struct DrawParams {
    pub columns: u32,
    pub rows: u32,
}

impl DrawParams {
    pub fn clamped(columns: u32, rows: u32) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }
}

impl<W: Write> KittyRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            image_id: 1,
            placement_id: 1,
        }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn draw(&mut self, image: &RenderImage, params: DrawParams) -> Result<()> {
        let mut buffer = Vec::new();
        let mut encoder = Encoder::new(&mut buffer, image.width, image.height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.pixels)?;
        writer.finish()?;

        let encoded = BASE64.encode(&buffer);
        let mut chunks = encoded.as_bytes().chunks(4096).peekable();
        let mut first = true;

        while let Some(chunk) = chunks.next() {
            let more = chunks.peek().is_some();
            if first {
                write!(
                    self.writer,
                    "\u{1b}_Ga=T,f=100,C=1,q=2,i={},p={},c={},r={},s={},v={},z=-1,m={}",
                    self.image_id,
                    self.placement_id,
                    params.columns,
                    params.rows,
                    image.width,
                    image.height,
                    u8::from(more)
                )?;
                first = false;
            } else {
                write!(self.writer, "\u{1b}_Gm={},q=2", u8::from(more))?;
            }
            if !chunk.is_empty() {
                self.writer.write_all(b";")?;
                self.writer.write_all(chunk)?;
            }
            write!(self.writer, "\u{1b}\\")?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Removes every placed image, used when the document is gone.
    pub fn delete_images(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}_Ga=d,d=A,q=2\u{1b}\\")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn begin_sync_update(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}[?2026h")?;
        Ok(())
    }

    /// Disables synchronized updates.
    /// The terminal will render all buffered changes at once.
    pub fn end_sync_update(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}[?2026l")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<()> {
        crossterm::execute!(
            &mut self.writer,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }
}

/// Inputs collected on the status line before an action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    Comment,
    Export,
    Create,
    Combine,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Open => "Open PDF file: ",
            PromptKind::Comment => "Add comment: ",
            PromptKind::Export => "Export PDF to: ",
            PromptKind::Create => "Create PDF at: ",
            PromptKind::Combine => "Select PDFs to combine: ",
        }
    }

    /// Whether the prompt only makes sense with an open document.
    pub fn requires_document(self) -> bool {
        matches!(self, PromptKind::Comment | PromptKind::Export)
    }

    /// The action as if its dialog had been dismissed without input.
    pub fn cancelled_command(self) -> Option<Command> {
        let action = match self {
            PromptKind::Open => return None,
            PromptKind::Comment => FeatureAction::AddComment { text: None },
            PromptKind::Export => FeatureAction::ExportPdf { target: None },
            PromptKind::Create => FeatureAction::CreatePdf { target: None },
            PromptKind::Combine => FeatureAction::CombineFiles {
                sources: Vec::new(),
            },
        };
        Some(Command::Feature(action))
    }

    pub fn submit_command(self, input: &str) -> Option<Command> {
        let trimmed = input.trim();
        let path = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        match self {
            PromptKind::Open => path.map(|path| Command::OpenDocument { path }),
            PromptKind::Comment => Some(Command::Feature(FeatureAction::AddComment {
                text: Some(input.to_string()),
            })),
            PromptKind::Export => Some(Command::Feature(FeatureAction::ExportPdf { target: path })),
            PromptKind::Create => Some(Command::Feature(FeatureAction::CreatePdf { target: path })),
            PromptKind::Combine => Some(Command::Feature(FeatureAction::CombineFiles {
                sources: trimmed.split_whitespace().map(PathBuf::from).collect(),
            })),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Move,
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Command(Command),
    BeginSearch,
    SearchQueryChanged { query: String },
    SearchSubmit { query: String },
    SearchCancel,
    BeginPrompt { kind: PromptKind },
    PromptChanged,
    PromptSubmit { kind: PromptKind, input: String },
    PromptCancel { kind: PromptKind },
    Pointer { kind: PointerKind, column: u16, row: u16 },
    Pan { delta_x: f32, delta_y: f32 },
    Quit,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Prompt(PromptKind),
}

#[derive(Debug)]
pub struct EventMapper {
    pending_count: Option<usize>,
    pending_digits: String,
    mode: InputMode,
    input_buffer: String,
    zoom_step: i64,
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::with_zoom_step(DEFAULT_ZOOM_STEP)
    }
}

impl EventMapper {
    pub const PAN_STEP: f32 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zoom_step(zoom_step: u32) -> Self {
        Self {
            pending_count: None,
            pending_digits: String::new(),
            mode: InputMode::Normal,
            input_buffer: String::new(),
            zoom_step: i64::from(zoom_step.max(1)),
        }
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            self.input_buffer.clear();
            self.reset_count();
            self.mode = mode;
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn map_event(&mut self, event: Event) -> UiEvent {
        match self.mode {
            InputMode::Normal => self.map_event_normal(event),
            InputMode::Search => self.map_event_search(event),
            InputMode::Prompt(kind) => self.map_event_prompt(kind, event),
        }
    }

    fn map_event_normal(&mut self, event: Event) -> UiEvent {
        match event {
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => self.map_key_normal(code, modifiers),
            Event::Mouse(mouse) => {
                self.reset_count();
                map_mouse(mouse)
            }
            _ => UiEvent::None,
        }
    }

    fn map_key_normal(&mut self, code: KeyCode, modifiers: KeyModifiers) -> UiEvent {
        let shifted = modifiers == KeyModifiers::SHIFT || modifiers.is_empty();
        match (code, modifiers) {
            (KeyCode::Char(c), KeyModifiers::NONE) if c.is_ascii_digit() => {
                if let Some(digit) = c.to_digit(10) {
                    self.push_digit(digit as usize);
                }
                UiEvent::None
            }
            (KeyCode::Left, modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
                self.pan(-Self::PAN_STEP, 0.0)
            }
            (KeyCode::Right, modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
                self.pan(Self::PAN_STEP, 0.0)
            }
            (KeyCode::Up, modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
                self.pan(0.0, -Self::PAN_STEP)
            }
            (KeyCode::Down, modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
                self.pan(0.0, Self::PAN_STEP)
            }
            (KeyCode::Char('H'), _) if shifted => self.pan(-Self::PAN_STEP, 0.0),
            (KeyCode::Char('L'), _) if shifted => self.pan(Self::PAN_STEP, 0.0),
            (KeyCode::Char('K'), _) if shifted => self.pan(0.0, -Self::PAN_STEP),
            (KeyCode::Char('J'), _) if shifted => self.pan(0.0, Self::PAN_STEP),
            (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                match self.pending_count.take() {
                    Some(page) if page > 0 => {
                        self.reset_count();
                        UiEvent::Command(Command::GotoPage { page: page - 1 })
                    }
                    _ => {
                        self.reset_count();
                        UiEvent::Command(Command::FirstPage)
                    }
                }
            }
            (KeyCode::Char('/'), KeyModifiers::NONE) => {
                self.set_mode(InputMode::Search);
                UiEvent::BeginSearch
            }
            (KeyCode::Char('q'), _) => {
                self.reset_count();
                UiEvent::Quit
            }
            (code, modifiers) => {
                self.reset_count();
                match self.plain_key(code, modifiers, shifted) {
                    Some(event) => event,
                    None => UiEvent::None,
                }
            }
        }
    }

    fn plain_key(&mut self, code: KeyCode, modifiers: KeyModifiers, shifted: bool) -> Option<UiEvent> {
        let command = match (code, modifiers) {
            (KeyCode::Char('j'), KeyModifiers::NONE)
            | (KeyCode::Char(' '), KeyModifiers::NONE)
            | (KeyCode::Down, KeyModifiers::NONE)
            | (KeyCode::Right, KeyModifiers::NONE)
            | (KeyCode::PageDown, _) => Command::NextPage,
            (KeyCode::Char('k'), KeyModifiers::NONE)
            | (KeyCode::Up, KeyModifiers::NONE)
            | (KeyCode::Left, KeyModifiers::NONE)
            | (KeyCode::PageUp, _) => Command::PrevPage,
            (KeyCode::Char('G'), _) | (KeyCode::End, _) if shifted => Command::LastPage,
            (KeyCode::Char('+'), _) => Command::ZoomBy {
                delta: self.zoom_step,
            },
            (KeyCode::Char('-'), _) => Command::ZoomBy {
                delta: -self.zoom_step,
            },
            (KeyCode::Char('='), _) => Command::ResetZoom,
            (KeyCode::Char('n'), KeyModifiers::NONE) => Command::SearchNext,
            (KeyCode::Char('N'), _) if shifted => Command::SearchPrev,
            (KeyCode::Char('M'), _) if shifted => Command::ToggleMeasure,
            (KeyCode::Char('C'), _) if shifted => Command::Feature(FeatureAction::SendForComments),
            (KeyCode::Char('f'), KeyModifiers::NONE) => {
                Command::Feature(FeatureAction::FillAndSign)
            }
            (KeyCode::Char('e'), KeyModifiers::NONE) => Command::Feature(FeatureAction::EditPdf),
            (KeyCode::Char('a'), KeyModifiers::NONE) => {
                Command::Feature(FeatureAction::AiAssistant)
            }
            (KeyCode::Char('s'), KeyModifiers::NONE) => {
                Command::Feature(FeatureAction::GenerateSummary)
            }
            (KeyCode::Char('S'), _) if shifted => Command::Feature(FeatureAction::Share),
            (KeyCode::Char('t'), KeyModifiers::NONE) => Command::Feature(FeatureAction::AddStamp),
            (KeyCode::Char(c), KeyModifiers::NONE) => {
                let kind = match c {
                    'o' => PromptKind::Open,
                    'c' => PromptKind::Comment,
                    'x' => PromptKind::Export,
                    'w' => PromptKind::Create,
                    'b' => PromptKind::Combine,
                    _ => return None,
                };
                self.set_mode(InputMode::Prompt(kind));
                return Some(UiEvent::BeginPrompt { kind });
            }
            _ => return None,
        };
        Some(UiEvent::Command(command))
    }

    fn map_event_search(&mut self, event: Event) -> UiEvent {
        match event {
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => match (code, modifiers) {
                (KeyCode::Esc, _) => {
                    self.set_mode(InputMode::Normal);
                    UiEvent::SearchCancel
                }
                (KeyCode::Enter, _) => {
                    let query = std::mem::take(&mut self.input_buffer);
                    self.set_mode(InputMode::Normal);
                    UiEvent::SearchSubmit { query }
                }
                (KeyCode::Backspace, _) => {
                    self.input_buffer.pop();
                    UiEvent::SearchQueryChanged {
                        query: self.input_buffer.clone(),
                    }
                }
                (KeyCode::Char(c), mods) if mods.is_empty() || mods == KeyModifiers::SHIFT => {
                    self.input_buffer.push(c);
                    UiEvent::SearchQueryChanged {
                        query: self.input_buffer.clone(),
                    }
                }
                _ => UiEvent::None,
            },
            _ => UiEvent::None,
        }
    }

    fn map_event_prompt(&mut self, kind: PromptKind, event: Event) -> UiEvent {
        match event {
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => match (code, modifiers) {
                (KeyCode::Esc, _) => {
                    self.set_mode(InputMode::Normal);
                    UiEvent::PromptCancel { kind }
                }
                (KeyCode::Enter, _) => {
                    let input = std::mem::take(&mut self.input_buffer);
                    self.set_mode(InputMode::Normal);
                    UiEvent::PromptSubmit { kind, input }
                }
                (KeyCode::Backspace, _) => {
                    self.input_buffer.pop();
                    UiEvent::PromptChanged
                }
                (KeyCode::Char(c), mods) if mods.is_empty() || mods == KeyModifiers::SHIFT => {
                    self.input_buffer.push(c);
                    UiEvent::PromptChanged
                }
                _ => UiEvent::None,
            },
            _ => UiEvent::None,
        }
    }

    fn push_digit(&mut self, digit: usize) {
        let current = self.pending_count.unwrap_or(0);
        let next = current.saturating_mul(10).saturating_add(digit);
        self.pending_count = Some(next);
        if let Some(c) = char::from_digit(digit as u32, 10) {
            self.pending_digits.push(c);
        }
    }

    fn take_count(&mut self) -> usize {
        let count = self
            .pending_count
            .take()
            .filter(|&count| count > 0)
            .unwrap_or(1);
        self.pending_digits.clear();
        count
    }

    fn reset_count(&mut self) {
        self.pending_count = None;
        self.pending_digits.clear();
    }

    fn pan(&mut self, delta_x: f32, delta_y: f32) -> UiEvent {
        let multiplier = self.take_count() as f32;
        UiEvent::Pan {
            delta_x: delta_x * multiplier,
            delta_y: delta_y * multiplier,
        }
    }

    /// Text being typed, shown on the status line.
    pub fn pending_input(&self) -> Option<String> {
        match self.mode {
            InputMode::Search => Some(format!("/{}", self.input_buffer)),
            InputMode::Prompt(kind) => Some(format!("{}{}", kind.label(), self.input_buffer)),
            InputMode::Normal if !self.pending_digits.is_empty() => {
                Some(self.pending_digits.clone())
            }
            InputMode::Normal => None,
        }
    }
}

fn map_mouse(mouse: MouseEvent) -> UiEvent {
    let kind = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerKind::Press,
        MouseEventKind::Drag(MouseButton::Left) => PointerKind::Move,
        MouseEventKind::Up(MouseButton::Left) => PointerKind::Release,
        _ => return UiEvent::None,
    };
    UiEvent::Pointer {
        kind,
        column: mouse.column,
        row: mouse.row,
    }
}

pub fn write_status_line<W: Write>(writer: &mut W, label: &str) -> io::Result<()> {
    write!(writer, "{}", label)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    #[test]
    fn kitty_draw_emits_protocol() {
        let mut renderer = KittyRenderer::new(Vec::new());
        let image = RenderImage {
            width: 1,
            height: 1,
            pixels: vec![255, 0, 0],
        };

        renderer.draw(&image, DrawParams::clamped(10, 5)).unwrap();
        let output = renderer.writer;
        assert_eq!(output[0], 0x1b);
        assert_eq!(output[1], b'_');
        assert_eq!(output[2], b'G');
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("c=10,r=5,s=1,v=1"));
        assert!(text.ends_with("\u{1b}\\"));
    }

    fn key_event(code: KeyCode) -> Event {
        key_event_with_modifiers(code, KeyModifiers::NONE)
    }

    fn key_event_with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse_event(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn type_text(mapper: &mut EventMapper, text: &str) {
        for c in text.chars() {
            mapper.map_event(key_event(KeyCode::Char(c)));
        }
    }

    #[test]
    fn event_mapper_maps_page_navigation_keys() {
        let mut mapper = EventMapper::new();
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('j'))),
            UiEvent::Command(Command::NextPage)
        );
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Right)),
            UiEvent::Command(Command::NextPage)
        );
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('k'))),
            UiEvent::Command(Command::PrevPage)
        );
        assert_eq!(
            mapper.map_event(key_event_with_modifiers(
                KeyCode::Char('G'),
                KeyModifiers::SHIFT
            )),
            UiEvent::Command(Command::LastPage)
        );
    }

    #[test]
    fn event_mapper_uses_numeric_prefix_for_goto() {
        let mut mapper = EventMapper::new();
        assert_eq!(mapper.map_event(key_event(KeyCode::Char('1'))), UiEvent::None);
        assert_eq!(mapper.map_event(key_event(KeyCode::Char('2'))), UiEvent::None);
        assert_eq!(mapper.pending_input().as_deref(), Some("12"));

        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('g'))),
            UiEvent::Command(Command::GotoPage { page: 11 })
        );
        assert!(mapper.pending_input().is_none());

        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('g'))),
            UiEvent::Command(Command::FirstPage)
        );
    }

    #[test]
    fn event_mapper_drops_prefix_on_other_command() {
        let mut mapper = EventMapper::new();
        assert_eq!(mapper.map_event(key_event(KeyCode::Char('4'))), UiEvent::None);
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('j'))),
            UiEvent::Command(Command::NextPage)
        );
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('g'))),
            UiEvent::Command(Command::FirstPage)
        );
    }

    #[test]
    fn event_mapper_zoom_keys_use_configured_step() {
        let mut mapper = EventMapper::with_zoom_step(25);
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('+'))),
            UiEvent::Command(Command::ZoomBy { delta: 25 })
        );
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('-'))),
            UiEvent::Command(Command::ZoomBy { delta: -25 })
        );
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('='))),
            UiEvent::Command(Command::ResetZoom)
        );
    }

    #[test]
    fn event_mapper_maps_ctrl_arrows_to_pan() {
        let mut mapper = EventMapper::new();

        match mapper.map_event(key_event_with_modifiers(
            KeyCode::Right,
            KeyModifiers::CONTROL,
        )) {
            UiEvent::Pan { delta_x, delta_y } => {
                assert!((delta_x - EventMapper::PAN_STEP).abs() < f32::EPSILON);
                assert_eq!(delta_y, 0.0);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        match mapper.map_event(key_event_with_modifiers(KeyCode::Up, KeyModifiers::CONTROL)) {
            UiEvent::Pan { delta_x, delta_y } => {
                assert_eq!(delta_x, 0.0);
                assert!((delta_y + EventMapper::PAN_STEP).abs() < f32::EPSILON);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn event_mapper_numeric_prefix_scales_pan_distance() {
        let mut mapper = EventMapper::new();
        assert_eq!(mapper.map_event(key_event(KeyCode::Char('3'))), UiEvent::None);
        match mapper.map_event(key_event_with_modifiers(
            KeyCode::Char('L'),
            KeyModifiers::SHIFT,
        )) {
            UiEvent::Pan { delta_x, delta_y } => {
                assert!((delta_x - 3.0 * EventMapper::PAN_STEP).abs() < f32::EPSILON);
                assert_eq!(delta_y, 0.0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn event_mapper_maps_n_and_uppercase_n_to_search_navigation() {
        let mut mapper = EventMapper::new();
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('n'))),
            UiEvent::Command(Command::SearchNext)
        );
        assert_eq!(
            mapper.map_event(key_event_with_modifiers(
                KeyCode::Char('N'),
                KeyModifiers::SHIFT
            )),
            UiEvent::Command(Command::SearchPrev)
        );
    }

    #[test]
    fn event_mapper_slash_enters_search_mode_and_collects_input() {
        let mut mapper = EventMapper::new();

        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('/'))),
            UiEvent::BeginSearch
        );
        assert_eq!(mapper.pending_input().as_deref(), Some("/"));

        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('f'))),
            UiEvent::SearchQueryChanged {
                query: "f".to_string()
            }
        );
        assert_eq!(mapper.pending_input().as_deref(), Some("/f"));

        assert_eq!(
            mapper.map_event(key_event(KeyCode::Backspace)),
            UiEvent::SearchQueryChanged {
                query: String::new()
            }
        );

        assert_eq!(
            mapper.map_event(key_event_with_modifiers(
                KeyCode::Char('G'),
                KeyModifiers::SHIFT
            )),
            UiEvent::SearchQueryChanged {
                query: "G".to_string()
            }
        );

        assert_eq!(
            mapper.map_event(key_event(KeyCode::Enter)),
            UiEvent::SearchSubmit {
                query: "G".to_string()
            }
        );
        assert_eq!(mapper.mode(), InputMode::Normal);
        assert!(mapper.pending_input().is_none());
    }

    #[test]
    fn event_mapper_search_escape_cancels() {
        let mut mapper = EventMapper::new();
        mapper.map_event(key_event(KeyCode::Char('/')));
        type_text(&mut mapper, "abc");
        assert_eq!(mapper.map_event(key_event(KeyCode::Esc)), UiEvent::SearchCancel);
        assert_eq!(mapper.mode(), InputMode::Normal);
    }

    #[test]
    fn event_mapper_prompt_collects_path() {
        let mut mapper = EventMapper::new();
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('o'))),
            UiEvent::BeginPrompt {
                kind: PromptKind::Open
            }
        );
        type_text(&mut mapper, "a.pdf");
        assert_eq!(
            mapper.pending_input().as_deref(),
            Some("Open PDF file: a.pdf")
        );
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Enter)),
            UiEvent::PromptSubmit {
                kind: PromptKind::Open,
                input: "a.pdf".to_string()
            }
        );
        assert_eq!(mapper.mode(), InputMode::Normal);
    }

    #[test]
    fn event_mapper_prompt_escape_cancels() {
        let mut mapper = EventMapper::new();
        mapper.map_event(key_event(KeyCode::Char('c')));
        type_text(&mut mapper, "draft");
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Esc)),
            UiEvent::PromptCancel {
                kind: PromptKind::Comment
            }
        );
        assert!(mapper.pending_input().is_none());
    }

    #[test]
    fn event_mapper_maps_feature_shortcuts() {
        let mut mapper = EventMapper::new();
        assert_eq!(
            mapper.map_event(key_event(KeyCode::Char('f'))),
            UiEvent::Command(Command::Feature(FeatureAction::FillAndSign))
        );
        assert_eq!(
            mapper.map_event(key_event_with_modifiers(
                KeyCode::Char('S'),
                KeyModifiers::SHIFT
            )),
            UiEvent::Command(Command::Feature(FeatureAction::Share))
        );
        assert_eq!(
            mapper.map_event(key_event_with_modifiers(
                KeyCode::Char('M'),
                KeyModifiers::SHIFT
            )),
            UiEvent::Command(Command::ToggleMeasure)
        );
        assert_eq!(mapper.map_event(key_event(KeyCode::Char('z'))), UiEvent::None);
    }

    #[test]
    fn event_mapper_maps_left_mouse_gesture() {
        let mut mapper = EventMapper::new();
        assert_eq!(
            mapper.map_event(mouse_event(MouseEventKind::Down(MouseButton::Left), 3, 4)),
            UiEvent::Pointer {
                kind: PointerKind::Press,
                column: 3,
                row: 4
            }
        );
        assert_eq!(
            mapper.map_event(mouse_event(MouseEventKind::Drag(MouseButton::Left), 8, 6)),
            UiEvent::Pointer {
                kind: PointerKind::Move,
                column: 8,
                row: 6
            }
        );
        assert_eq!(
            mapper.map_event(mouse_event(MouseEventKind::Up(MouseButton::Left), 8, 6)),
            UiEvent::Pointer {
                kind: PointerKind::Release,
                column: 8,
                row: 6
            }
        );
        assert_eq!(
            mapper.map_event(mouse_event(MouseEventKind::Down(MouseButton::Right), 1, 1)),
            UiEvent::None
        );
    }

    #[test]
    fn event_mapper_ignores_mouse_while_typing() {
        let mut mapper = EventMapper::new();
        mapper.map_event(key_event(KeyCode::Char('/')));
        assert_eq!(
            mapper.map_event(mouse_event(MouseEventKind::Down(MouseButton::Left), 3, 4)),
            UiEvent::None
        );
    }

    #[test]
    fn prompt_submissions_become_commands() {
        assert_eq!(
            PromptKind::Open.submit_command("  report.pdf "),
            Some(Command::OpenDocument {
                path: PathBuf::from("report.pdf")
            })
        );
        assert_eq!(PromptKind::Open.submit_command("   "), None);
        assert_eq!(
            PromptKind::Combine.submit_command("a.pdf b.pdf  c.pdf"),
            Some(Command::Feature(FeatureAction::CombineFiles {
                sources: vec![
                    PathBuf::from("a.pdf"),
                    PathBuf::from("b.pdf"),
                    PathBuf::from("c.pdf")
                ]
            }))
        );
        assert_eq!(
            PromptKind::Export.submit_command(""),
            Some(Command::Feature(FeatureAction::ExportPdf { target: None }))
        );
        assert_eq!(PromptKind::Open.cancelled_command(), None);
        assert!(PromptKind::Comment.requires_document());
        assert!(!PromptKind::Combine.requires_document());
    }
}
