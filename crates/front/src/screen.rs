// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{trace, warn};
use unicode_width::UnicodeWidthChar;

use crate::cursor::CursorGeometry;
use crate::event::{InputEvent, TerminalKey};

/// Write side of the screen buffer: where gestures land.
pub trait ScreenInput: Send + Sync {
    fn press(&self, key: TerminalKey);
    /// Move the scrollback viewport; positive moves towards the newest output.
    fn scroll(&self, lines: i32);
}

/// Read side of the screen buffer used on every paint.
pub trait CursorSource {
    /// Geometry of the visible cursor, or `None` when nothing should be drawn.
    fn cursor_geometry(&self) -> Option<CursorGeometry>;
}

/// Pixel size of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// Screen buffer backed by an `avt` virtual terminal.
///
/// Keys are encoded as VT sequences and sent to the session on `input_tx`.
/// Scrolling only moves the local viewport over the scrollback.
pub struct VtScreen {
    inner: RwLock<ScreenInner>,
    cell: RwLock<CellSize>,
    input_tx: mpsc::Sender<InputEvent>,
}

struct ScreenInner {
    vt: avt::Vt,
    cols: usize,
    rows: usize,
    /// Lines scrolled back from the live screen; 0 follows the output.
    scroll_back: usize,
}

impl std::fmt::Debug for VtScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("VtScreen")
            .field("cols", &inner.cols)
            .field("rows", &inner.rows)
            .field("scroll_back", &inner.scroll_back)
            .field("cell", &*self.cell.read())
            .finish()
    }
}

impl VtScreen {
    pub fn new(cols: u16, rows: u16, cell: CellSize, input_tx: mpsc::Sender<InputEvent>) -> Self {
        let (cols, rows) = (cols as usize, rows as usize);
        Self {
            inner: RwLock::new(ScreenInner { vt: avt::Vt::new(cols, rows), cols, rows, scroll_back: 0 }),
            cell: RwLock::new(cell),
            input_tx,
        }
    }

    /// Feed decoded session output into the terminal.
    pub fn feed_str(&self, text: &str) {
        let _ = self.inner.write().vt.feed_str(text);
    }

    /// Update the cell size after a font change.
    pub fn set_cell_size(&self, cell: CellSize) {
        *self.cell.write() = cell;
    }

    pub fn cell_size(&self) -> CellSize {
        *self.cell.read()
    }

    pub fn scroll_back(&self) -> usize {
        self.inner.read().scroll_back
    }

    /// Visible text lines with trailing whitespace trimmed.
    pub fn lines(&self) -> Vec<String> {
        self.inner.read().vt.view().map(|line| line.text().trim_end().to_owned()).collect()
    }
}

impl ScreenInner {
    fn history_len(&self) -> usize {
        self.vt.lines().count().saturating_sub(self.rows)
    }
}

impl ScreenInput for VtScreen {
    fn press(&self, key: TerminalKey) {
        // Typing follows the output again.
        self.inner.write().scroll_back = 0;
        let event = InputEvent::Write(Bytes::from_static(key.encode()));
        match self.input_tx.try_send(event) {
            Ok(()) => trace!("screen: injected {key}"),
            Err(mpsc::error::TrySendError::Full(_)) => warn!("screen: input channel full, {key} dropped"),
            Err(mpsc::error::TrySendError::Closed(_)) => trace!("screen: session gone, {key} dropped"),
        }
    }

    fn scroll(&self, lines: i32) {
        let mut inner = self.inner.write();
        let max = inner.history_len();
        let back = inner.scroll_back as i64 - i64::from(lines);
        inner.scroll_back = back.clamp(0, max as i64) as usize;
        trace!("screen: scrolled {lines} lines, {} back", inner.scroll_back);
    }
}

impl CursorSource for VtScreen {
    fn cursor_geometry(&self) -> Option<CursorGeometry> {
        let inner = self.inner.read();
        let cursor = inner.vt.cursor();
        if !cursor.visible || inner.cols == 0 {
            return None;
        }

        // A cursor parked after the last column is drawn on the last column.
        let column = cursor.col.min(inner.cols - 1);
        let row = cursor.row + inner.scroll_back;
        if row >= inner.rows {
            return None;
        }

        let double_width = inner
            .vt
            .view()
            .nth(cursor.row)
            .and_then(|line| line.cells().get(column).map(|cell| cell.char()))
            .and_then(UnicodeWidthChar::width)
            == Some(2);

        let cell = *self.cell.read();
        Some(CursorGeometry {
            column: column as u32,
            row: row as u32,
            cell_width: cell.width,
            cell_height: cell.height,
            double_width,
        })
    }
}

#[cfg(test)]
#[path = "screen_tests.rs"]
mod tests;
