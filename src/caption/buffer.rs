//! 15x32 character grid backing the displayed and non-displayed caption memories

use crate::constants::{SCREEN_COLS, SCREEN_ROWS};
use crate::eia608::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub text: Option<char>,
    pub style: Style,
    pub underline: bool,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        self.text.is_none()
    }

    fn glyph(&self) -> char {
        self.text.unwrap_or(' ')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionFrameBuffer {
    cells: [[Cell; SCREEN_COLS]; SCREEN_ROWS],
}

impl Default for CaptionFrameBuffer {
    fn default() -> Self {
        Self { cells: [[Cell::default(); SCREEN_COLS]; SCREEN_ROWS] }
    }
}

impl CaptionFrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row)?.get(col)
    }

    /// Stores `c` at `row`/`col`. Returns false when the position is off screen.
    pub fn write_char(&mut self, row: usize, col: usize, style: Style, underline: bool, c: char) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = Cell { text: Some(c), style, underline };
                true
            }
            None => false,
        }
    }

    pub fn blank(&mut self, row: usize, col: usize) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = Cell::default();
        }
    }

    /// Moves rows `from..15` up by one and clears the bottom row.
    pub fn scroll_up_from(&mut self, from: usize) {
        let from = from.clamp(1, SCREEN_ROWS);
        for r in from..SCREEN_ROWS {
            self.cells[r - 1] = self.cells[r];
        }
        self.cells[SCREEN_ROWS - 1] = [Cell::default(); SCREEN_COLS];
    }

    /// One row with blank cells as spaces, right-trimmed.
    pub fn row_text(&self, row: usize) -> String {
        match self.cells.get(row) {
            Some(cells) => {
                let line: String = cells.iter().map(Cell::glyph).collect();
                line.trim_end().to_string()
            }
            None => String::new(),
        }
    }

    /// Non-blank rows, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        (0..SCREEN_ROWS)
            .map(|r| self.row_text(r))
            .filter(|l| !l.is_empty())
            .collect()
    }

    pub fn to_text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Cell::is_blank)
    }

    /// Bordered grid with row numbers and a column ruler.
    pub fn dump(&self) -> String {
        let mut out = String::with_capacity((SCREEN_COLS + 8) * (SCREEN_ROWS + 4) * 3);
        out.push_str("   00000000001111111111222222222233\n");
        out.push_str("   01234567890123456789012345678901\n");
        out.push_str(&format!("  ┌{}┐\n", "─".repeat(SCREEN_COLS)));
        for (r, cells) in self.cells.iter().enumerate() {
            out.push_str(&format!("{r:02}│"));
            out.extend(cells.iter().map(Cell::glyph));
            out.push_str("│\n");
        }
        out.push_str(&format!("  └{}┘\n", "─".repeat(SCREEN_COLS)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_str(buf: &mut CaptionFrameBuffer, row: usize, col: usize, s: &str) {
        for (i, c) in s.chars().enumerate() {
            assert!(buf.write_char(row, col + i, Style::White, false, c));
        }
    }

    #[test]
    fn text_trims_and_skips_blank_rows() {
        let mut buf = CaptionFrameBuffer::new();
        write_str(&mut buf, 3, 2, "HELLO");
        write_str(&mut buf, 10, 0, "WORLD ");
        assert_eq!(buf.to_text(), "  HELLO\nWORLD");
        assert_eq!(buf.lines().len(), 2);
    }

    #[test]
    fn writes_off_screen_fail() {
        let mut buf = CaptionFrameBuffer::new();
        assert!(!buf.write_char(0, SCREEN_COLS, Style::White, false, 'X'));
        assert!(!buf.write_char(SCREEN_ROWS, 0, Style::White, false, 'X'));
        assert!(buf.is_empty());
    }

    #[test]
    fn scroll_moves_rows_up() {
        let mut buf = CaptionFrameBuffer::new();
        write_str(&mut buf, 13, 0, "ONE");
        write_str(&mut buf, 14, 0, "TWO");
        buf.scroll_up_from(14);
        assert_eq!(buf.row_text(12), "");
        assert_eq!(buf.row_text(13), "TWO");
        assert_eq!(buf.row_text(14), "");
    }

    #[test]
    fn blank_resets_cell() {
        let mut buf = CaptionFrameBuffer::new();
        assert!(buf.write_char(1, 1, Style::Red, true, 'Z'));
        buf.blank(1, 1);
        assert_eq!(buf.cell(1, 1), Some(&Cell::default()));
    }

    #[test]
    fn dump_has_one_line_per_row() {
        let mut buf = CaptionFrameBuffer::new();
        write_str(&mut buf, 0, 0, "A");
        let dump = buf.dump();
        assert_eq!(dump.lines().count(), SCREEN_ROWS + 4);
        assert!(dump.contains("00│A "));
    }
}
