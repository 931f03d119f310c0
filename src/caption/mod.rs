//! EIA-608 decoder state machine over a double-buffered caption grid

mod buffer;

pub use buffer::{CaptionFrameBuffer, Cell};

use std::fmt;
use serde::{Serialize, Serializer};
use tracing::trace;
use crate::constants::{SCREEN_COLS, SCREEN_ROWS};
use crate::eia608::{self, Control, Eia608Code, Style};
use crate::error::{CaptionError, Result};
use crate::types::Status;

/// Rows shown per roll-up setting
const ROLLUP_ROWS: [u8; 4] = [0, 2, 3, 4];

/// Which memory decode operations target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteTarget {
    #[default]
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionMode {
    Uninitialized,
    PaintOn,
    RollUp(u8),
    PopOn,
}

impl fmt::Display for CaptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionMode::Uninitialized => f.write_str("uninitialized"),
            CaptionMode::PaintOn => f.write_str("paint-on"),
            CaptionMode::RollUp(n) => write!(f, "roll-up-{n}"),
            CaptionMode::PopOn => f.write_str("pop-on"),
        }
    }
}

impl Serialize for CaptionMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Cursor and pen state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionFrameState {
    pub row: usize,
    pub col: usize,
    pub style: Style,
    pub underline: bool,
    /// Index into the roll-up table: 0 = off, 1..=3 = 2..=4 rows
    pub roll_up_count: u8,
    /// Last raw code word, for duplicate control suppression
    pub last_code: u16,
}

impl Default for CaptionFrameState {
    fn default() -> Self {
        Self {
            row: SCREEN_ROWS - 1,
            col: 0,
            style: Style::White,
            underline: false,
            roll_up_count: 0,
            last_code: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptionFrame {
    pub state: CaptionFrameState,
    front: CaptionFrameBuffer,
    back: CaptionFrameBuffer,
    write: WriteTarget,
    timestamp: Option<f64>,
    status: Status,
}

impl Default for CaptionFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptionFrame {
    pub fn new() -> Self {
        Self {
            state: CaptionFrameState::default(),
            front: CaptionFrameBuffer::new(),
            back: CaptionFrameBuffer::new(),
            write: WriteTarget::None,
            timestamp: None,
            status: Status::Ok,
        }
    }

    pub fn front(&self) -> &CaptionFrameBuffer {
        &self.front
    }

    pub fn back(&self) -> &CaptionFrameBuffer {
        &self.back
    }

    pub fn write_target(&self) -> WriteTarget {
        self.write
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn rollup_rows(&self) -> u8 {
        ROLLUP_ROWS[self.state.roll_up_count as usize & 0x03]
    }

    pub fn mode(&self) -> CaptionMode {
        match self.write {
            WriteTarget::None => CaptionMode::Uninitialized,
            WriteTarget::Back => CaptionMode::PopOn,
            WriteTarget::Front if self.state.roll_up_count == 0 => CaptionMode::PaintOn,
            WriteTarget::Front => CaptionMode::RollUp(self.rollup_rows()),
        }
    }

    fn target(&mut self) -> Option<&mut CaptionFrameBuffer> {
        match self.write {
            WriteTarget::None => None,
            WriteTarget::Front => Some(&mut self.front),
            WriteTarget::Back => Some(&mut self.back),
        }
    }

    /// Feeds one parity-encoded code word.
    ///
    /// A parity failure marks the frame `Error` and is returned as
    /// [`CaptionError::ParityError`]; the next code decodes normally.
    pub fn decode(&mut self, cc: u16, timestamp: f64) -> Result<Status> {
        if !eia608::parity_verify(cc) {
            self.status = Status::Error;
            return Err(CaptionError::ParityError { code: cc });
        }

        if eia608::is_padding(cc) {
            self.status = Status::Ok;
            return Ok(self.status);
        }

        if self.timestamp.is_none() || self.timestamp == Some(timestamp) || self.status == Status::Ready {
            self.timestamp = Some(timestamp);
            self.status = Status::Ok;
        }

        // control codes are sent twice
        if (eia608::is_specialna(cc) || eia608::is_control(cc)) && cc == self.state.last_code {
            trace!(cc, "duplicate suppressed");
            self.status = Status::Ok;
            return Ok(self.status);
        }
        self.state.last_code = cc;

        let code = Eia608Code::classify(cc);
        self.status = match code {
            Eia608Code::Control { control, .. } => self.decode_control(control),
            c if c.is_text() => {
                if self.write == WriteTarget::None {
                    Status::Ok
                } else {
                    self.decode_text(cc, c == Eia608Code::WestEu);
                    if self.write == WriteTarget::Front { Status::Ready } else { Status::Ok }
                }
            }
            Eia608Code::Preamble(p) => {
                self.state.row = p.row;
                self.state.col = p.col;
                self.state.style = p.style;
                self.state.underline = p.underline;
                Status::Ok
            }
            Eia608Code::Midrow(m) => {
                self.state.style = m.style;
                self.state.underline = m.underline;
                Status::Ok
            }
            _ => Status::Ok,
        };
        trace!(cc, ?code, status = ?self.status, "decoded");
        Ok(self.status)
    }

    fn decode_control(&mut self, control: Control) -> Status {
        match control {
            Control::ResumeDirectCaptioning => {
                self.state.roll_up_count = 0;
                self.write = WriteTarget::Front;
                Status::Ok
            }
            Control::EraseDisplayMemory => {
                self.front.clear();
                Status::Ready
            }
            Control::RollUp2 | Control::RollUp3 | Control::RollUp4 => {
                self.state.roll_up_count = match control {
                    Control::RollUp2 => 1,
                    Control::RollUp3 => 2,
                    _ => 3,
                };
                self.write = WriteTarget::Front;
                Status::Ok
            }
            Control::CarriageReturn => self.carriage_return(),
            Control::Backspace => self.backspace(),
            Control::DeleteToEndOfRow => {
                let (row, col) = (self.state.row, self.state.col);
                if let Some(buf) = self.target() {
                    for c in col..SCREEN_COLS {
                        buf.blank(row, c);
                    }
                }
                Status::Ready
            }
            Control::ResumeCaptionLoading => {
                self.state.roll_up_count = 0;
                self.write = WriteTarget::Back;
                Status::Ok
            }
            Control::EraseNonDisplayedMemory => {
                self.back.clear();
                Status::Ok
            }
            Control::EndOfCaption => {
                self.front = std::mem::take(&mut self.back);
                Status::Ready
            }
            other => {
                if let Some(n) = other.tab_offset() {
                    self.state.col = (self.state.col + n).min(SCREEN_COLS - 1);
                }
                Status::Ok
            }
        }
    }

    fn carriage_return(&mut self) -> Status {
        let r = self.state.row as i32 - (self.state.roll_up_count as i32 - 1);
        if r <= 0 || self.rollup_rows() == 0 {
            return Status::Ok;
        }
        if let Some(buf) = self.target() {
            buf.scroll_up_from(r as usize);
        }
        self.state.col = 0;
        Status::Ok
    }

    /// Steps back one column (never past column 0) and blanks that cell.
    fn backspace(&mut self) -> Status {
        self.state.col = self.state.col.saturating_sub(1);
        let (row, col) = (self.state.row, self.state.col);
        if let Some(buf) = self.target() {
            buf.blank(row, col);
        }
        Status::Ready
    }

    fn write_char(&mut self, c: char) {
        let CaptionFrameState { row, col, style, underline, .. } = self.state;
        let written = self.target().is_some_and(|buf| buf.write_char(row, col, style, underline, c));
        if written {
            self.state.col += 1;
        }
    }

    fn decode_text(&mut self, cc: u16, westeu: bool) {
        // extended characters overwrite the base character sent before them
        if westeu {
            self.backspace();
        }
        for c in eia608::to_chars(cc) {
            self.write_char(c);
        }
    }

    /// Displayed memory as text: right-trimmed rows, blank rows dropped.
    pub fn to_text(&self) -> String {
        self.front.to_text()
    }

    /// Cursor state, mode and the displayed grid.
    pub fn dump(&self) -> String {
        let ts = self.timestamp.unwrap_or(0.0);
        format!(
            "   timestamp: {ts:.6}  mode: {}\n   row: {:02}  col: {:02}  roll-up: {}\n{}",
            self.mode(),
            self.state.row,
            self.state.col,
            self.rollup_rows(),
            self.front.dump(),
        )
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            timestamp: self.timestamp.unwrap_or(0.0),
            mode: self.mode(),
            lines: self.front.lines(),
            grid: self.front.clone(),
        }
    }
}

/// Displayed memory captured when a frame became ready
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub timestamp: f64,
    pub mode: CaptionMode,
    pub lines: Vec<String>,
    #[serde(skip)]
    pub grid: CaptionFrameBuffer,
}

impl FrameSnapshot {
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn dump(&self) -> String {
        format!("   timestamp: {:.6}  mode: {}\n{}", self.timestamp, self.mode, self.grid.dump())
    }
}
