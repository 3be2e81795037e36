//! C2: the user-selected set of Unicode blocks.
//!
//! Backed by a `u64` bitmask, one bit per block tag — the same
//! bit-per-tag technique this codebase already uses for its ASCII and
//! Unicode-block filters, just indexed by individual block tag instead
//! of by block group.

use crate::classify::{tag_by_name, BASIC_LATIN, BLOCKS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSet(u64);

impl BlockSet {
    /// Empty set, BasicLatin always implicitly present.
    pub fn new() -> Self {
        Self(0).with_basic_latin_always()
    }

    /// All defined blocks.
    pub fn all() -> Self {
        let mut s = Self(0);
        for tag in 0..BLOCKS.len() as u8 {
            s = s.insert(tag);
        }
        s
    }

    #[must_use]
    pub fn with_basic_latin_always(self) -> Self {
        self.insert(BASIC_LATIN)
    }

    #[must_use]
    pub fn insert(self, tag: u8) -> Self {
        Self(self.0 | (1u64 << tag as u32))
    }

    pub fn contains(&self, tag: u8) -> bool {
        self.0 & (1u64 << tag as u32) != 0
    }

    /// Block-run compatibility, delegated to the classifier's rule.
    pub fn compatible(&self, tag_a: u8, tag_b: u8) -> bool {
        crate::classify::compatible(tag_a, tag_b)
    }

    /// Build a `BlockSet` from friendly names as they'd arrive from a
    /// `--blocks` style option; `"all"` (case-insensitive) selects
    /// every defined block.
    pub fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<Self, String> {
        let mut s = Self::new();
        for name in names {
            if name.eq_ignore_ascii_case("all") {
                return Ok(Self::all());
            }
            match tag_by_name(name) {
                Some(tag) => s = s.insert(tag),
                None => return Err(format!("unknown block name `{name}`")),
            }
        }
        Ok(s)
    }
}

impl Default for BlockSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_latin_always_present() {
        let s = BlockSet::from_names(std::iter::empty()).unwrap();
        assert!(s.contains(BASIC_LATIN));
    }

    #[test]
    fn all_alias_selects_everything() {
        let s = BlockSet::from_names(["all"].into_iter()).unwrap();
        for tag in 0..BLOCKS.len() as u8 {
            assert!(s.contains(tag));
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(BlockSet::from_names(["Klingon"].into_iter()).is_err());
    }

    #[test]
    fn misc_symbols_only_excludes_cyrillic() {
        let s = BlockSet::from_names(["MiscellaneousSymbols"].into_iter()).unwrap();
        let misc = super::tag_by_name("MiscellaneousSymbols").unwrap();
        let cyrillic = super::tag_by_name("Cyrillic").unwrap();
        assert!(s.contains(misc));
        assert!(!s.contains(cyrillic));
    }
}
