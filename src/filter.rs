//! C4: an optional predicate over decoded runs.
//!
//! Shell wildcards are compiled to an equivalent `regex::Regex`, the
//! same approach this codebase's lineage uses elsewhere in the pack
//! for glob-like matching.

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy)]
pub struct FilterOptions {
    pub case_insensitive: bool,
    pub multiline: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            multiline: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Filter {
    None,
    Compiled(Regex),
}

impl Filter {
    pub fn none() -> Self {
        Filter::None
    }

    pub fn regex(pattern: &str, opts: FilterOptions) -> Result<Self, regex::Error> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(opts.case_insensitive)
            .multi_line(opts.multiline)
            .build()?;
        Ok(Filter::Compiled(re))
    }

    /// Compile a shell wildcard pattern (`*`, `?`) into an equivalent
    /// regex. Default options: case-insensitive, single pattern.
    pub fn wildcard(pattern: &str) -> Result<Self, regex::Error> {
        let mut re_source = String::with_capacity(pattern.len() * 2 + 2);
        re_source.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => re_source.push_str(".*"),
                '?' => re_source.push('.'),
                c if "\\.+^$()[]{}|".contains(c) => {
                    re_source.push('\\');
                    re_source.push(c);
                }
                c => re_source.push(c),
            }
        }
        re_source.push('$');
        let re = RegexBuilder::new(&re_source)
            .case_insensitive(true)
            .build()?;
        Ok(Filter::Compiled(re))
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Filter::None => true,
            Filter::Compiled(re) => re.is_match(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filter_matches_everything() {
        let f = Filter::none();
        assert!(f.is_match(""));
        assert!(f.is_match("anything"));
    }

    #[test]
    fn regex_filter_matches_pattern() {
        let f = Filter::regex(r"^/[a-z]+$", FilterOptions::default()).unwrap();
        assert!(f.is_match("/usr"));
        assert!(!f.is_match("usr/"));
    }

    #[test]
    fn wildcard_filter_compiles_star_and_question_mark() {
        let f = Filter::wildcard("*.txt").unwrap();
        assert!(f.is_match("report.txt"));
        assert!(!f.is_match("report.txtx"));

        let f2 = Filter::wildcard("file?.log").unwrap();
        assert!(f2.is_match("file1.log"));
        assert!(!f2.is_match("file12.log"));
    }

    #[test]
    fn wildcard_is_case_insensitive_by_default() {
        let f = Filter::wildcard("*.TXT").unwrap();
        assert!(f.is_match("report.txt"));
    }
}
