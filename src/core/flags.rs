//! Pattern modifier flags.
//!
//! A plain data bag covering the full PCRE modifier alphabet the validator
//! and linter reason about (`i m s u x U A D S J`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PatternFlags {
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub extended: bool,
    pub ungreedy: bool,
    pub anchored: bool,
    pub dollar_endonly: bool,
    pub study: bool,
    /// `J`: allow duplicate named groups.
    pub dupnames: bool,
}

impl PatternFlags {
    pub fn from_letters(letters: &str) -> Self {
        let mut f = PatternFlags::default();
        for ch in letters.chars() {
            match ch {
                'i' => f.ignore_case = true,
                'm' => f.multiline = true,
                's' => f.dot_all = true,
                'u' => f.unicode = true,
                'x' => f.extended = true,
                'U' => f.ungreedy = true,
                'A' => f.anchored = true,
                'D' => f.dollar_endonly = true,
                'S' => f.study = true,
                'J' => f.dupnames = true,
                _ => {
                    // Unknown flag letters are reported by the parser, not here.
                }
            }
        }
        f
    }

    /// Apply an inline `(?im-sx)` delta on top of these flags, returning the
    /// resulting flag set. Letters before `-` are set, letters after are
    /// cleared.
    pub fn apply_inline(&self, local_flags: &str) -> PatternFlags {
        let mut result = *self;
        let mut clearing = false;
        for ch in local_flags.chars() {
            if ch == '-' {
                clearing = true;
                continue;
            }
            let value = !clearing;
            match ch {
                'i' => result.ignore_case = value,
                'm' => result.multiline = value,
                's' => result.dot_all = value,
                'u' => result.unicode = value,
                'x' => result.extended = value,
                'U' => result.ungreedy = value,
                'J' => result.dupnames = value,
                _ => {}
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_letters_sets_expected_fields() {
        let f = PatternFlags::from_letters("ism");
        assert!(f.ignore_case);
        assert!(f.dot_all);
        assert!(f.multiline);
        assert!(!f.unicode);
    }

    #[test]
    fn apply_inline_sets_and_clears() {
        let base = PatternFlags::from_letters("i");
        let applied = base.apply_inline("s-i");
        assert!(applied.dot_all);
        assert!(!applied.ignore_case);
    }
}
