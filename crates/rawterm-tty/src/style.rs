// SPDX-License-Identifier: MIT
//
// Style codec — abstract styles and styled text to SGR escape output.
//
// Two shapes of styling live here:
//
//   Style: a complete cell style, i.e. attribute flags plus foreground and
//   background colors. The grid renderer compares these between cells.
//
//   StyledText: an ordered list of instructions (`Bold`, `Foreground(c)`,
//   `Text("..")`, `Reset`, ...). Attribute instructions apply to every later
//   `Text` until a `Reset`. Compiling it with `apply_styles` queues SGR codes
//   and flushes them as one escape sequence right before the next run of
//   text, so `[Bold, Foreground(1), Text("hi")]` costs one `ESC[1;31m`, not
//   two escapes.
//
// When the destination is not a terminal, `strip_styles` keeps only the text
// so logs and pipes never see escape bytes.

use bitflags::bitflags;
use unicode_width::UnicodeWidthStr;

use crate::ansi;
use crate::color::Color;

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags! {
    /// Boolean text attributes, each mapping to one SGR parameter.
    ///
    /// ```
    /// use rawterm_tty::style::Attr;
    ///
    /// let attrs = Attr::BOLD | Attr::UNDERLINED;
    /// assert!(attrs.contains(Attr::BOLD));
    /// assert!(!attrs.contains(Attr::BLINK));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1.
        const BOLD       = 1 << 0;
        /// SGR 4.
        const UNDERLINED = 1 << 1;
        /// SGR 5.
        const BLINK      = 1 << 2;
        /// SGR 7.
        const INVERSE    = 1 << 3;
        /// SGR 8.
        const HIDDEN     = 1 << 4;
    }
}

impl Attr {
    /// SGR codes for the set flags, in ascending code order.
    fn push_codes(self, codes: &mut Vec<u8>) {
        const TABLE: [(Attr, u8); 5] = [
            (Attr::BOLD, ansi::BOLD),
            (Attr::UNDERLINED, ansi::UNDERLINE),
            (Attr::BLINK, ansi::BLINK),
            (Attr::INVERSE, ansi::INVERSE),
            (Attr::HIDDEN, ansi::HIDDEN),
        ];
        for (flag, code) in TABLE {
            if self.contains(flag) {
                codes.push(code);
            }
        }
    }
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// A complete cell style: attributes and two colors.
///
/// The default value is the blank style: no attributes, terminal default
/// colors. That is also the state a terminal is in right after `ESC[0m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Style {
    pub attrs: Attr,
    pub foreground: Color,
    pub background: Color,
}

impl Style {
    /// No attributes, default colors.
    #[inline]
    #[must_use]
    pub const fn blank() -> Self {
        Self {
            attrs: Attr::empty(),
            foreground: Color::DEFAULT,
            background: Color::DEFAULT,
        }
    }

    #[inline]
    #[must_use]
    pub const fn bold(self) -> Self {
        self.with(Attr::BOLD)
    }

    #[inline]
    #[must_use]
    pub const fn underlined(self) -> Self {
        self.with(Attr::UNDERLINED)
    }

    #[inline]
    #[must_use]
    pub const fn blink(self) -> Self {
        self.with(Attr::BLINK)
    }

    #[inline]
    #[must_use]
    pub const fn inverse(self) -> Self {
        self.with(Attr::INVERSE)
    }

    #[inline]
    #[must_use]
    pub const fn hidden(self) -> Self {
        self.with(Attr::HIDDEN)
    }

    const fn with(self, attr: Attr) -> Self {
        Self {
            attrs: self.attrs.union(attr),
            ..self
        }
    }

    /// Set the foreground color.
    #[inline]
    #[must_use]
    pub const fn fg(self, foreground: Color) -> Self {
        Self { foreground, ..self }
    }

    /// Set the background color.
    #[inline]
    #[must_use]
    pub const fn bg(self, background: Color) -> Self {
        Self { background, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn is_bold(self) -> bool {
        self.attrs.contains(Attr::BOLD)
    }

    #[inline]
    #[must_use]
    pub const fn is_underlined(self) -> bool {
        self.attrs.contains(Attr::UNDERLINED)
    }

    #[inline]
    #[must_use]
    pub const fn is_blink(self) -> bool {
        self.attrs.contains(Attr::BLINK)
    }

    #[inline]
    #[must_use]
    pub const fn is_inverse(self) -> bool {
        self.attrs.contains(Attr::INVERSE)
    }

    #[inline]
    #[must_use]
    pub const fn is_hidden(self) -> bool {
        self.attrs.contains(Attr::HIDDEN)
    }

    /// Layer `other` on top of `self`.
    ///
    /// Attributes are combined; a non-default color in `other` replaces the
    /// corresponding color in `self`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            attrs: self.attrs.union(other.attrs),
            foreground: if other.foreground.is_default() {
                self.foreground
            } else {
                other.foreground
            },
            background: if other.background.is_default() {
                self.background
            } else {
                other.background
            },
        }
    }

    /// The full SGR parameter list that puts a terminal in this style from
    /// any prior state: a leading reset, the attribute codes, then any
    /// non-default colors.
    ///
    /// ```
    /// use rawterm_tty::{color::Color, style::Style};
    ///
    /// let codes = Style::blank().bold().fg(Color::RED).sgr_codes();
    /// assert_eq!(codes, [0, 1, 31]);
    /// ```
    #[must_use]
    pub fn sgr_codes(self) -> Vec<u8> {
        let mut codes = Vec::with_capacity(8);
        codes.push(ansi::RESET);
        self.attrs.push_codes(&mut codes);
        if !self.foreground.is_default() {
            ansi::fg_codes(&mut codes, self.foreground);
        }
        if !self.background.is_default() {
            ansi::bg_codes(&mut codes, self.background);
        }
        codes
    }
}

// ─── Styled Text ─────────────────────────────────────────────────────────────

/// One step of a [`StyledText`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Literal text, written with whatever style is active.
    Text(String),
    /// Reset all attributes and colors (SGR 0).
    Reset,
    Bold,
    Underlined,
    Blink,
    Inverse,
    Hidden,
    Foreground(Color),
    Background(Color),
}

impl Instruction {
    /// Queue this instruction's SGR codes. `Text` queues nothing.
    fn push_codes(&self, codes: &mut Vec<u8>) {
        match self {
            Self::Text(_) => {}
            Self::Reset => codes.push(ansi::RESET),
            Self::Bold => codes.push(ansi::BOLD),
            Self::Underlined => codes.push(ansi::UNDERLINE),
            Self::Blink => codes.push(ansi::BLINK),
            Self::Inverse => codes.push(ansi::INVERSE),
            Self::Hidden => codes.push(ansi::HIDDEN),
            Self::Foreground(c) => ansi::fg_codes(codes, *c),
            Self::Background(c) => ansi::bg_codes(codes, *c),
        }
    }
}

/// An ordered list of styling instructions and text.
///
/// Build one fluently:
///
/// ```
/// use rawterm_tty::{color::Color, style::{apply_styles, StyledText}};
///
/// let text = StyledText::new().bold().fg(Color::RED).text("hi").reset();
/// assert_eq!(apply_styles(&text), "\x1b[1;31mhi\x1b[0m");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledText {
    instructions: Vec<Instruction>,
}

impl StyledText {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    /// Append an arbitrary instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.push(Instruction::Text(text.into()));
        self
    }

    #[must_use]
    pub fn reset(mut self) -> Self {
        self.push(Instruction::Reset);
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.push(Instruction::Bold);
        self
    }

    #[must_use]
    pub fn underlined(mut self) -> Self {
        self.push(Instruction::Underlined);
        self
    }

    #[must_use]
    pub fn blink(mut self) -> Self {
        self.push(Instruction::Blink);
        self
    }

    #[must_use]
    pub fn inverse(mut self) -> Self {
        self.push(Instruction::Inverse);
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.push(Instruction::Hidden);
        self
    }

    #[must_use]
    pub fn fg(mut self, color: Color) -> Self {
        self.push(Instruction::Foreground(color));
        self
    }

    #[must_use]
    pub fn bg(mut self, color: Color) -> Self {
        self.push(Instruction::Background(color));
        self
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Text payloads in order, skipping style instructions.
    fn texts(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

impl From<Vec<Instruction>> for StyledText {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl FromIterator<Instruction> for StyledText {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StyledText {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

// ─── Codec ───────────────────────────────────────────────────────────────────

/// Compile styled text into an escape-sequence string.
///
/// Attribute instructions only queue codes. A `Text` flushes the queue as one
/// SGR sequence (nothing if the queue is empty) immediately before the text,
/// so at most one escape precedes any run of literal text. Codes still
/// queued after the last instruction are flushed at the end.
#[must_use]
pub fn apply_styles(text: &StyledText) -> String {
    let mut out = String::new();
    let mut pending: Vec<u8> = Vec::new();

    for instruction in text {
        match instruction {
            Instruction::Text(s) => {
                ansi::sgr(&mut out, &pending).ok();
                pending.clear();
                out.push_str(s);
            }
            other => other.push_codes(&mut pending),
        }
    }
    ansi::sgr(&mut out, &pending).ok();

    out
}

/// Concatenate only the text payloads, dropping every style instruction.
#[must_use]
pub fn strip_styles(text: &StyledText) -> String {
    text.texts().collect()
}

/// Total display width of the text payloads. Style instructions are
/// zero-width.
#[must_use]
pub fn styled_length(text: &StyledText) -> usize {
    text.texts().map(UnicodeWidthStr::width).sum()
}

/// Write `text` to `out`, compiled or stripped depending on whether the
/// destination is an interactive terminal.
pub(crate) fn render_for(out: &mut String, text: &StyledText, interactive: bool) {
    let rendered = if interactive {
        apply_styles(text)
    } else {
        strip_styles(text)
    };
    out.push_str(&rendered);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn styled(instructions: Vec<Instruction>) -> StyledText {
        StyledText::from(instructions)
    }

    fn text(s: &str) -> Instruction {
        Instruction::Text(s.to_string())
    }

    // ── apply_styles ────────────────────────────────────────────────────

    #[test]
    fn pending_codes_merge_into_one_sequence() {
        let t = styled(vec![
            Instruction::Bold,
            Instruction::Foreground(Color::RED),
            text("hi"),
            Instruction::Reset,
        ]);
        let out = apply_styles(&t);
        assert_eq!(out, "\x1b[1;31mhi\x1b[0m");
        assert_eq!(out.matches('\x1b').count(), 2);
    }

    #[test]
    fn plain_text_has_no_escapes() {
        assert_eq!(apply_styles(&styled(vec![text("abc"), text("def")])), "abcdef");
    }

    #[test]
    fn empty_text_is_empty() {
        assert_eq!(apply_styles(&StyledText::new()), "");
    }

    #[test]
    fn trailing_codes_flush_at_end() {
        let t = styled(vec![text("x"), Instruction::Underlined, Instruction::Blink]);
        assert_eq!(apply_styles(&t), "x\x1b[4;5m");
    }

    #[test]
    fn each_text_run_gets_its_own_prefix() {
        let t = StyledText::new()
            .bold()
            .text("a")
            .inverse()
            .hidden()
            .text("b")
            .text("c");
        assert_eq!(apply_styles(&t), "\x1b[1ma\x1b[7;8mbc");
    }

    #[test]
    fn default_colors() {
        let t = styled(vec![
            Instruction::Foreground(Color::DEFAULT),
            Instruction::Background(Color::DEFAULT),
            text("d"),
        ]);
        assert_eq!(apply_styles(&t), "\x1b[39;49md");
    }

    #[test]
    fn basic_and_extended_colors() {
        let t = StyledText::new()
            .fg(Color::WHITE)
            .bg(Color::BLUE)
            .text("a")
            .fg(Color::LIGHT_RED)
            .bg(Color::index(200))
            .text("b");
        assert_eq!(apply_styles(&t), "\x1b[37;44ma\x1b[38;5;9;48;5;200mb");
    }

    #[test]
    fn reset_between_texts() {
        let t = StyledText::new().bold().text("a").reset().text("b");
        assert_eq!(apply_styles(&t), "\x1b[1ma\x1b[0mb");
    }

    // ── strip_styles / styled_length ────────────────────────────────────

    #[test]
    fn strip_keeps_only_text() {
        let t = StyledText::new()
            .bold()
            .text("hello")
            .fg(Color::GREEN)
            .text(", ")
            .reset()
            .text("world")
            .blink();
        assert_eq!(strip_styles(&t), "hello, world");
    }

    #[test]
    fn strip_is_idempotent() {
        let t = StyledText::new().underlined().text("a").bg(Color::RED).text("b");
        let once = strip_styles(&t);
        let twice = strip_styles(&StyledText::new().text(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn styled_length_ignores_styles() {
        let t = StyledText::new().bold().text("abc").fg(Color::RED).text("de");
        assert_eq!(styled_length(&t), 5);
    }

    #[test]
    fn styled_length_counts_display_width() {
        let t = StyledText::new().text("中文").text("a");
        assert_eq!(styled_length(&t), 5);
    }

    #[test]
    fn render_for_gates_on_interactivity() {
        let t = StyledText::new().bold().text("x");
        let mut tty = String::new();
        render_for(&mut tty, &t, true);
        let mut pipe = String::new();
        render_for(&mut pipe, &t, false);
        assert_eq!(tty, "\x1b[1mx");
        assert_eq!(pipe, "x");
    }

    // ── Style ───────────────────────────────────────────────────────────

    #[test]
    fn blank_is_default() {
        assert_eq!(Style::blank(), Style::default());
        assert_eq!(Style::blank().sgr_codes(), [0]);
    }

    #[test]
    fn builder_sets_flags() {
        let s = Style::blank().bold().underlined().blink().inverse().hidden();
        assert!(s.is_bold() && s.is_underlined() && s.is_blink());
        assert!(s.is_inverse() && s.is_hidden());
        assert_eq!(s.sgr_codes(), [0, 1, 4, 5, 7, 8]);
    }

    #[test]
    fn sgr_codes_include_colors() {
        let s = Style::blank().fg(Color::index(100)).bg(Color::CYAN);
        assert_eq!(s.sgr_codes(), [0, 38, 5, 100, 46]);
    }

    #[test]
    fn merge_layers_colors_and_attrs() {
        let base = Style::blank().bold().fg(Color::RED).bg(Color::BLUE);
        let top = Style::blank().underlined().fg(Color::GREEN);
        let merged = base.merge(top);
        assert!(merged.is_bold() && merged.is_underlined());
        assert_eq!(merged.foreground, Color::GREEN);
        assert_eq!(merged.background, Color::BLUE);
    }

    #[test]
    fn collect_from_instructions() {
        let t: StyledText = vec![Instruction::Bold, text("x")].into_iter().collect();
        assert_eq!(t.instructions().len(), 2);
        assert!(!t.is_empty());
    }
}
