// SPDX-License-Identifier: MIT
//
// Terminal palette colors.
//
// A color is an index into the terminal's 256-entry palette, plus one
// sentinel for "whatever the terminal's default is":
//
//   -1        terminal default (SGR 39 / 49)
//   0..=7     standard colors  (SGR 30-37 / 40-47)
//   8..=15    bright colors    (SGR 38;5;N / 48;5;N)
//   16..=255  extended palette (SGR 38;5;N / 48;5;N)
//
// Values outside that range never make it into a `Color`: the only fallible
// constructor rejects them with `Error::InvalidColor`.

use std::fmt;

use crate::error::{Error, Result};

/// A palette color index, or the terminal default.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(Index);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
enum Index {
    #[default]
    Default,
    Palette(u8),
}

impl Color {
    /// The terminal's default color (`-1`).
    pub const DEFAULT: Self = Self(Index::Default);

    pub const BLACK: Self = Self::index(0);
    pub const RED: Self = Self::index(1);
    pub const GREEN: Self = Self::index(2);
    pub const YELLOW: Self = Self::index(3);
    pub const BLUE: Self = Self::index(4);
    pub const MAGENTA: Self = Self::index(5);
    pub const CYAN: Self = Self::index(6);
    pub const WHITE: Self = Self::index(7);
    pub const LIGHT_BLACK: Self = Self::index(8);
    pub const LIGHT_RED: Self = Self::index(9);
    pub const LIGHT_GREEN: Self = Self::index(10);
    pub const LIGHT_YELLOW: Self = Self::index(11);
    pub const LIGHT_BLUE: Self = Self::index(12);
    pub const LIGHT_MAGENTA: Self = Self::index(13);
    pub const LIGHT_CYAN: Self = Self::index(14);
    pub const LIGHT_WHITE: Self = Self::index(15);

    /// A palette entry. Every `u8` is a valid index.
    #[inline]
    #[must_use]
    pub const fn index(n: u8) -> Self {
        Self(Index::Palette(n))
    }

    /// Validate an integer color: `-1` for default, `0..=255` for a palette
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] for anything else.
    pub fn new(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(Self::DEFAULT),
            0..=255 => u8::try_from(value)
                .map(Self::index)
                .map_err(|_| Error::InvalidColor(value)),
            _ => Err(Error::InvalidColor(value)),
        }
    }

    /// Whether this is the terminal default.
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self.0, Index::Default)
    }

    /// The palette index, or `None` for the terminal default.
    #[inline]
    #[must_use]
    pub const fn palette(self) -> Option<u8> {
        match self.0 {
            Index::Default => None,
            Index::Palette(n) => Some(n),
        }
    }

    /// The integer form: `-1` for default, otherwise the palette index.
    #[inline]
    #[must_use]
    pub fn value(self) -> i32 {
        self.palette().map_or(-1, i32::from)
    }
}

impl TryFrom<i32> for Color {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<u8> for Color {
    fn from(n: u8) -> Self {
        Self::index(n)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Index::Default => f.write_str("Color(default)"),
            Index::Palette(n) => write!(f, "Color({n})"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_minus_one() {
        assert_eq!(Color::DEFAULT.value(), -1);
        assert!(Color::DEFAULT.is_default());
        assert_eq!(Color::default(), Color::DEFAULT);
    }

    #[test]
    fn new_accepts_full_range() {
        assert_eq!(Color::new(-1).unwrap(), Color::DEFAULT);
        assert_eq!(Color::new(0).unwrap(), Color::BLACK);
        assert_eq!(Color::new(9).unwrap(), Color::LIGHT_RED);
        assert_eq!(Color::new(255).unwrap().palette(), Some(255));
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(matches!(Color::new(256), Err(Error::InvalidColor(256))));
        assert!(matches!(Color::new(-2), Err(Error::InvalidColor(-2))));
        assert!(Color::try_from(1000).is_err());
    }

    #[test]
    fn named_constants() {
        assert_eq!(Color::RED.value(), 1);
        assert_eq!(Color::WHITE.value(), 7);
        assert_eq!(Color::LIGHT_BLACK.value(), 8);
        assert_eq!(Color::LIGHT_WHITE.value(), 15);
    }

    #[test]
    fn from_u8() {
        assert_eq!(Color::from(42).palette(), Some(42));
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Color::DEFAULT), "Color(default)");
        assert_eq!(format!("{:?}", Color::index(200)), "Color(200)");
    }
}
