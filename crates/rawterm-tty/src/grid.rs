// SPDX-License-Identifier: MIT
//
// Grid — the 2D array of styled cells a full-screen frame is painted into,
// and the renderer that turns it into one terminal write.
//
// Design:
//
//   - Flat `Vec<Point>` with row-major indexing. A row's points are
//     contiguous, so the renderer's left-to-right, top-to-bottom walk is a
//     linear scan.
//
//   - The renderer tracks the last style it emitted, starting from the blank
//     style (which is what `ESC[0m` leaves the terminal in). A point whose
//     style equals the previous one costs only its character; a change costs
//     one `ESC[0;...m` carrying the complete new style.
//
//   - One frame is one `String`: home + reset, every row joined by `\r\n`,
//     and a closing reset. Raw mode disables output post-processing, so the
//     carriage return is spelled out.

use unicode_segmentation::UnicodeSegmentation;

use crate::ansi;
use crate::style::Style;

// ─── Point ───────────────────────────────────────────────────────────────────

/// One display cell: the text occupying it and its style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    /// Normally a single codepoint; may be a grapheme cluster.
    pub ch: String,
    pub style: Style,
}

impl Point {
    /// A space with the blank style.
    #[must_use]
    pub fn blank() -> Self {
        Self::new(" ", Style::blank())
    }

    #[must_use]
    pub fn new(ch: impl Into<String>, style: Style) -> Self {
        Self {
            ch: ch.into(),
            style,
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::blank()
    }
}

// ─── Grid ────────────────────────────────────────────────────────────────────

/// A fixed-size grid of [`Point`]s, rows then columns.
///
/// ```
/// use rawterm_tty::grid::Grid;
/// use rawterm_tty::style::Style;
///
/// let mut grid = Grid::new(4, 1);
/// grid.put_str(0, 0, "hey", Style::blank().bold());
/// assert_eq!(grid.get(1, 0).unwrap().ch, "e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: u16,
    rows: u16,
    points: Vec<Point>,
}

impl Grid {
    /// A `cols × rows` grid of blank points.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        let len = usize::from(cols) * usize::from(rows);
        Self {
            cols,
            rows,
            points: vec![Point::blank(); len],
        }
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.cols && y < self.rows)
            .then(|| usize::from(y) * usize::from(self.cols) + usize::from(x))
    }

    /// The point at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Point> {
        self.index(x, y).map(|i| &self.points[i])
    }

    /// Replace the point at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, point: Point) {
        if let Some(i) = self.index(x, y) {
            self.points[i] = point;
        }
    }

    /// Write `text` starting at `(x, y)`, one grapheme per cell, clipped at
    /// the right edge. Returns the number of cells written.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let mut written = 0;
        for (col, grapheme) in (x..self.cols).zip(text.graphemes(true)) {
            self.set(col, y, Point::new(grapheme, style));
            written += 1;
        }
        written
    }

    /// Set every point's style, keeping its text.
    pub fn fill(&mut self, style: Style) {
        for point in &mut self.points {
            point.style = style;
        }
    }

    /// Iterate rows as slices.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[Point]> {
        // `chunks` panics on 0; a zero-width grid has no rows to yield.
        self.points.chunks(usize::from(self.cols.max(1)))
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Render the grid as one terminal write.
///
/// Output: cursor home and attribute reset, then each point's character in
/// row-major order with an SGR sequence only where the style differs from
/// the previous point's, rows separated by `\r\n`, then a final reset.
#[must_use]
pub fn render(grid: &Grid) -> String {
    // Roughly one byte per cell plus row breaks; style changes grow it.
    let mut out = String::with_capacity(grid.points.len() + usize::from(grid.rows) * 2 + 16);
    ansi::cursor_home(&mut out).ok();
    ansi::reset(&mut out).ok();

    let mut last = Style::blank();
    for (y, row) in grid.rows_iter().enumerate() {
        if y > 0 {
            out.push_str("\r\n");
        }
        for point in row {
            if point.style != last {
                ansi::sgr(&mut out, &point.style.sgr_codes()).ok();
                last = point.style;
            }
            out.push_str(&point.ch);
        }
    }

    ansi::reset(&mut out).ok();
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use pretty_assertions::assert_eq;

    const PROLOGUE: &str = "\x1b[H\x1b[0m";
    const EPILOGUE: &str = "\x1b[0m";

    /// Strip prologue and epilogue, leaving only the cell stream.
    fn body(frame: &str) -> &str {
        frame
            .strip_prefix(PROLOGUE)
            .and_then(|s| s.strip_suffix(EPILOGUE))
            .expect("frame framing")
    }

    // ── Grid ────────────────────────────────────────────────────────────

    #[test]
    fn new_grid_is_blank() {
        let grid = Grid::new(3, 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.get(2, 1), Some(&Point::blank()));
    }

    #[test]
    fn get_out_of_bounds() {
        let grid = Grid::new(3, 2);
        assert!(grid.get(3, 0).is_none());
        assert!(grid.get(0, 2).is_none());
    }

    #[test]
    fn set_out_of_bounds_is_ignored() {
        let mut grid = Grid::new(1, 1);
        grid.set(5, 5, Point::new("x", Style::blank()));
        assert_eq!(grid, Grid::new(1, 1));
    }

    #[test]
    fn put_str_clips_at_right_edge() {
        let mut grid = Grid::new(3, 1);
        assert_eq!(grid.put_str(1, 0, "abcd", Style::blank()), 2);
        assert_eq!(grid.get(0, 0).unwrap().ch, " ");
        assert_eq!(grid.get(1, 0).unwrap().ch, "a");
        assert_eq!(grid.get(2, 0).unwrap().ch, "b");
    }

    #[test]
    fn put_str_keeps_graphemes_together() {
        let mut grid = Grid::new(4, 1);
        grid.put_str(0, 0, "e\u{301}x", Style::blank());
        assert_eq!(grid.get(0, 0).unwrap().ch, "e\u{301}");
        assert_eq!(grid.get(1, 0).unwrap().ch, "x");
    }

    #[test]
    fn fill_sets_styles() {
        let mut grid = Grid::new(2, 2);
        let style = Style::blank().inverse();
        grid.fill(style);
        assert!(grid.rows_iter().flatten().all(|p| p.style == style));
    }

    // ── render ──────────────────────────────────────────────────────────

    #[test]
    fn blank_grid_has_no_style_changes() {
        let frame = render(&Grid::new(3, 2));
        assert_eq!(frame, "\x1b[H\x1b[0m   \r\n   \x1b[0m");
    }

    #[test]
    fn uniform_style_emits_one_sgr() {
        let mut grid = Grid::new(40, 10);
        grid.fill(Style::blank().bold().fg(Color::index(123)));
        let frame = render(&grid);
        let cells = body(&frame);
        assert_eq!(cells.matches('\x1b').count(), 1);
        assert!(cells.starts_with("\x1b[0;1;38;5;123m"));
    }

    #[test]
    fn style_change_emits_only_at_boundaries() {
        let mut grid = Grid::new(4, 1);
        let red = Style::blank().fg(Color::RED);
        grid.put_str(0, 0, "ab", red);
        grid.put_str(2, 0, "cd", Style::blank());
        assert_eq!(body(&render(&grid)), "\x1b[0;31mab\x1b[0mcd");
    }

    #[test]
    fn style_carries_across_rows() {
        let mut grid = Grid::new(2, 2);
        let style = Style::blank().underlined();
        grid.fill(style);
        grid.put_str(0, 0, "ab", style);
        grid.put_str(0, 1, "cd", style);
        assert_eq!(body(&render(&grid)), "\x1b[0;4mab\r\ncd");
    }

    #[test]
    fn empty_grid_renders_framing_only() {
        assert_eq!(render(&Grid::new(0, 0)), "\x1b[H\x1b[0m\x1b[0m");
    }
}
