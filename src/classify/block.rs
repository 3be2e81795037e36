//! Unicode block table and block-run compatibility (C1, half two).
//!
//! `BLOCKS` is the literal range description the code-point table is
//! generated from; `CODE_POINT_BLOCK` is the resulting 65,536-entry
//! lookup, built once behind a `lazy_static!` the same way the rest of
//! this codebase keeps its large immutable tables.

use lazy_static::lazy_static;

/// Sentinel tag meaning "code point has no tracked block".
pub const NO_BLOCK: u8 = 0xFF;

/// `(name, low, high)` inclusive BMP ranges. Index in this array is the
/// block's tag, so reordering this array changes tag values.
pub const BLOCKS: &[(&str, u16, u16)] = &[
    ("BasicLatin", 0x0000, 0x007F),                 // 0
    ("Latin1Supplement", 0x0080, 0x00FF),            // 1
    ("LatinExtendedA", 0x0100, 0x017F),              // 2
    ("LatinExtendedB", 0x0180, 0x024F),              // 3
    ("IpaExtensions", 0x0250, 0x02AF),                // 4
    ("SpacingModifierLetters", 0x02B0, 0x02FF),      // 5
    ("CombiningDiacriticalMarks", 0x0300, 0x036F),   // 6
    ("GreekAndCoptic", 0x0370, 0x03FF),               // 7
    ("Cyrillic", 0x0400, 0x04FF),                     // 8
    ("CyrillicSupplement", 0x0500, 0x052F),          // 9
    ("Armenian", 0x0530, 0x058F),                     // 10
    ("Hebrew", 0x0590, 0x05FF),                       // 11
    ("Arabic", 0x0600, 0x06FF),                       // 12
    ("Syriac", 0x0700, 0x074F),                       // 13
    ("Thaana", 0x0780, 0x07BF),                       // 14
    ("Devanagari", 0x0900, 0x097F),                   // 15
    ("Bengali", 0x0980, 0x09FF),                      // 16
    ("HangulJamo", 0x1100, 0x11FF),                   // 17
    ("LatinExtendedAdditional", 0x1E00, 0x1EFF),     // 18
    ("GreekExtended", 0x1F00, 0x1FFF),                // 19
    ("GeneralPunctuation", 0x2000, 0x206F),          // 20
    ("CurrencySymbols", 0x20A0, 0x20CF),              // 21
    ("LetterlikeSymbols", 0x2100, 0x214F),            // 22
    ("NumberForms", 0x2150, 0x218F),                  // 23
    ("Arrows", 0x2190, 0x21FF),                       // 24
    ("MathematicalOperators", 0x2200, 0x22FF),       // 25
    ("MiscellaneousTechnical", 0x2300, 0x23FF),      // 26
    ("BoxDrawing", 0x2500, 0x257F),                   // 27
    ("BlockElements", 0x2580, 0x259F),                // 28
    ("GeometricShapes", 0x25A0, 0x25FF),              // 29
    ("MiscellaneousSymbols", 0x2600, 0x26FF),         // 30
    ("Dingbats", 0x2700, 0x27BF),                     // 31
    ("LatinExtendedC", 0x2C60, 0x2C7F),               // 32
    ("CjkSymbolsAndPunctuation", 0x3000, 0x303F),    // 33
    ("Hiragana", 0x3040, 0x309F),                     // 34
    ("Katakana", 0x30A0, 0x30FF),                     // 35
    ("CjkUnifiedIdeographs", 0x4E00, 0x9FFF),        // 36
    ("HangulSyllables", 0xAC00, 0xD7A3),              // 37
    ("LatinExtendedD", 0xA720, 0xA7FF),               // 38
    ("LatinExtendedE", 0xAB30, 0xAB6F),               // 39
    ("PrivateUseArea", 0xE000, 0xF8FF),               // 40
    ("HalfwidthAndFullwidthForms", 0xFF00, 0xFFEF),  // 41
];

/// Tags that make up "BasicLatin ↔ LatinExtensions" equivalence class.
const LATIN_GROUP: &[u8] = &[0, 1, 2, 3, 18, 32, 38, 39];

lazy_static! {
    /// Code point -> block tag, 0xFF where unassigned. Built once.
    static ref CODE_POINT_BLOCK: Vec<u8> = {
        let mut table = vec![NO_BLOCK; 0x1_0000];
        for (tag, &(_, lo, hi)) in BLOCKS.iter().enumerate() {
            for cp in lo..=hi {
                table[cp as usize] = tag as u8;
            }
        }
        table
    };
}

/// Which block (if any) a BMP code point belongs to.
#[inline]
pub fn block_of(cp: u16) -> Option<u8> {
    match CODE_POINT_BLOCK[cp as usize] {
        NO_BLOCK => None,
        tag => Some(tag),
    }
}

/// Are two blocks compatible for the purposes of a single decoded run?
/// Identical blocks are always compatible; BasicLatin and every member
/// of the LatinExtensions union are compatible with each other.
#[inline]
pub fn compatible(a: u8, b: u8) -> bool {
    a == b || (LATIN_GROUP.contains(&a) && LATIN_GROUP.contains(&b))
}

/// Block tag by name, for the configuration layer's alias resolution.
pub fn tag_by_name(name: &str) -> Option<u8> {
    BLOCKS
        .iter()
        .position(|&(n, _, _)| n.eq_ignore_ascii_case(name))
        .map(|i| i as u8)
}

pub const BASIC_LATIN: u8 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_latin_covers_ascii() {
        assert_eq!(block_of(b'A' as u16), Some(BASIC_LATIN));
        assert_eq!(block_of(0x007F), Some(BASIC_LATIN));
    }

    #[test]
    fn snowman_is_misc_symbols() {
        assert_eq!(block_of(0x2603), tag_by_name("MiscellaneousSymbols"));
    }

    #[test]
    fn latin_extensions_are_compatible_with_basic_latin() {
        let basic = BASIC_LATIN;
        let ext_a = tag_by_name("LatinExtendedA").unwrap();
        let ext_additional = tag_by_name("LatinExtendedAdditional").unwrap();
        assert!(compatible(basic, ext_a));
        assert!(compatible(ext_a, ext_additional));
    }

    #[test]
    fn unrelated_blocks_are_not_compatible() {
        let cyrillic = tag_by_name("Cyrillic").unwrap();
        let hebrew = tag_by_name("Hebrew").unwrap();
        assert!(!compatible(cyrillic, hebrew));
    }

    #[test]
    fn surrogate_range_has_no_block() {
        assert_eq!(block_of(0xD800), None);
        assert_eq!(block_of(0xDFFF), None);
    }
}
