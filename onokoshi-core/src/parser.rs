//! Route text parser.
//!
//! Turns loosely formatted, hand-typed route lists into ordered [`Route`]
//! records. Two layouts are understood:
//!
//! * **flat**: one route per line, `Name 5`, `Name (5)`, `Name(5)` or `Name`;
//! * **grouped**: LiveSplit subsplit text, where `-Child` lines belong to the
//!   group named by the next `{Group}Last` line below them.
//!
//! Parsing never fails. A line that matches no count pattern becomes a route
//! named after the whole line with a count of zero.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::ConfigError;
use crate::constants::{
    DEFAULT_CHILD_MARKER, DEFAULT_GROUP_CLOSE, DEFAULT_GROUP_OPEN, LOG_TARGET_PARSER,
};
use crate::ids::IdSource;
use crate::model::Route;

/// Marker characters recognised by the grouped layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "ParserConfig::default_child_marker")]
    pub child_marker: char,
    #[serde(default = "ParserConfig::default_group_open")]
    pub group_open: char,
    #[serde(default = "ParserConfig::default_group_close")]
    pub group_close: char,
}

impl ParserConfig {
    const fn default_child_marker() -> char {
        DEFAULT_CHILD_MARKER
    }

    const fn default_group_open() -> char {
        DEFAULT_GROUP_OPEN
    }

    const fn default_group_close() -> char {
        DEFAULT_GROUP_CLOSE
    }

    /// Reject marker sets that would make lines ambiguous.
    ///
    /// # Errors
    ///
    /// Returns an error when a marker collides with another marker, with
    /// whitespace, or with the characters used by count suffixes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let markers = [
            ("parser.child_marker", self.child_marker),
            ("parser.group_open", self.group_open),
            ("parser.group_close", self.group_close),
        ];
        for (field, marker) in markers {
            if marker.is_whitespace() || marker.is_ascii_digit() || matches!(marker, '(' | ')') {
                return Err(ConfigError::InvalidMarker { field, marker });
            }
        }
        for (i, (first, a)) in markers.iter().enumerate() {
            for (second, b) in &markers[i + 1..] {
                if a == b {
                    return Err(ConfigError::DuplicateMarker {
                        first: *first,
                        second: *second,
                        marker: *a,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            child_marker: DEFAULT_CHILD_MARKER,
            group_open: DEFAULT_GROUP_OPEN,
            group_close: DEFAULT_GROUP_CLOSE,
        }
    }
}

/// Layout chosen for a given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Flat,
    Grouped,
}

/// Name and count extracted from a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCount {
    pub name: String,
    pub count: u32,
}

struct Draft {
    order: usize,
    entry: NameCount,
    group_name: Option<String>,
}

struct CountPatterns {
    parenthesized: Regex,
    bare: Regex,
}

fn count_patterns() -> Option<&'static CountPatterns> {
    static PATTERNS: OnceLock<Option<CountPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(CountPatterns {
                parenthesized: Regex::new(r"^(.+?)\s*\(([0-9]+)\)$").ok()?,
                bare: Regex::new(r"^(.+?)\s+([0-9]+)$").ok()?,
            })
        })
        .as_ref()
}

fn match_count(pattern: &Regex, line: &str) -> Option<NameCount> {
    let caps = pattern.captures(line)?;
    let count = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let name = caps.get(1)?.as_str().trim();
    Some(NameCount {
        name: name.to_string(),
        count,
    })
}

/// Split a trailing count off a single line using the flat-layout rules:
/// parenthesized integer first, then a whitespace separated integer, then
/// the whole line with a count of zero.
#[must_use]
pub fn split_count(line: &str) -> NameCount {
    let line = line.trim();
    count_patterns()
        .and_then(|patterns| {
            match_count(&patterns.parenthesized, line)
                .or_else(|| match_count(&patterns.bare, line))
        })
        .unwrap_or_else(|| NameCount {
            name: line.to_string(),
            count: 0,
        })
}

/// Trimmed, non-empty lines in input order.
fn significant_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Route parser bound to one marker configuration.
#[derive(Debug, Clone, Default)]
pub struct RouteParser {
    config: ParserConfig,
}

impl RouteParser {
    #[must_use]
    pub const fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `text` into routes, drawing one id per route from `ids` in
    /// presentation order.
    pub fn parse(&self, text: &str, ids: &mut impl IdSource) -> Vec<Route> {
        let lines = significant_lines(text);
        let mode = self.detect_mode(&lines);
        log::debug!(
            target: LOG_TARGET_PARSER,
            "parsing {} line(s) in {mode:?} mode",
            lines.len()
        );
        let mut drafts = match mode {
            ParseMode::Flat => Self::flat_drafts(&lines),
            ParseMode::Grouped => self.grouped_drafts(&lines),
        };
        drafts.sort_by_key(|draft| draft.order);
        drafts
            .into_iter()
            .map(|draft| Route {
                id: ids.next_id(),
                name: draft.entry.name,
                count: draft.entry.count,
                order: draft.order,
                group_name: draft.group_name,
            })
            .collect()
    }

    /// Grouped layout needs both a child line and a group marker somewhere.
    #[must_use]
    pub fn mode_for(&self, text: &str) -> ParseMode {
        self.detect_mode(&significant_lines(text))
    }

    fn detect_mode(&self, lines: &[&str]) -> ParseMode {
        let has_child = lines
            .iter()
            .any(|line| self.strip_child_marker(line).is_some());
        let has_group = lines.iter().any(|line| self.contains_group_marker(line));
        if has_child && has_group {
            ParseMode::Grouped
        } else {
            ParseMode::Flat
        }
    }

    fn flat_drafts(lines: &[&str]) -> Vec<Draft> {
        lines
            .iter()
            .enumerate()
            .map(|(order, line)| Draft {
                order,
                entry: split_count(line),
                group_name: None,
            })
            .collect()
    }

    /// Walk from the bottom up; a `{Group}` line names every child line above
    /// it until the next group line.
    fn grouped_drafts(&self, lines: &[&str]) -> Vec<Draft> {
        let (drafts, _) = lines.iter().enumerate().rev().fold(
            (Vec::with_capacity(lines.len()), None::<String>),
            |(mut drafts, active), (order, line)| {
                if let Some((label, remainder)) = self.split_group_marker(line) {
                    let group = split_count(label).name;
                    if !remainder.is_empty() {
                        drafts.push(Draft {
                            order,
                            entry: split_count(remainder),
                            group_name: Some(group.clone()),
                        });
                    }
                    (drafts, Some(group))
                } else if let Some(body) = self.strip_child_marker(line) {
                    drafts.push(Draft {
                        order,
                        entry: split_count(body),
                        group_name: active.clone(),
                    });
                    (drafts, active)
                } else {
                    drafts.push(Draft {
                        order,
                        entry: split_count(line),
                        group_name: None,
                    });
                    (drafts, active)
                }
            },
        );
        drafts
    }

    /// Body of a child line; a bare marker with nothing after it is not a child.
    fn strip_child_marker<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.strip_prefix(self.config.child_marker)
            .map(str::trim)
            .filter(|body| !body.is_empty())
    }

    /// `{label}remainder` at the start of the line, with a non-empty label.
    fn split_group_marker<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let rest = line.strip_prefix(self.config.group_open)?;
        let close = rest.find(self.config.group_close)?;
        let label = rest[..close].trim();
        if label.is_empty() {
            return None;
        }
        let remainder = rest[close + self.config.group_close.len_utf8()..].trim();
        Some((label, remainder))
    }

    fn contains_group_marker(&self, line: &str) -> bool {
        line.match_indices(self.config.group_open)
            .any(|(start, _)| self.split_group_marker(&line[start..]).is_some())
    }
}

/// Parse with the default markers.
pub fn parse_routes(text: &str, ids: &mut impl IdSource) -> Vec<Route> {
    RouteParser::default().parse(text, ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn parse(text: &str) -> Vec<Route> {
        parse_routes(text, &mut SequentialIds::default())
    }

    fn shape(routes: &[Route]) -> Vec<(&str, u32, usize, Option<&str>)> {
        routes
            .iter()
            .map(|r| (r.name.as_str(), r.count, r.order, r.group_name.as_deref()))
            .collect()
    }

    #[test]
    fn count_suffix_variants_agree() {
        for text in ["Foo 5", "Foo (5)", "Foo(5)"] {
            let routes = parse(text);
            assert_eq!(shape(&routes), vec![("Foo", 5, 0, None)], "input {text:?}");
        }
    }

    #[test]
    fn missing_count_defaults_to_zero() {
        assert_eq!(shape(&parse("Foo")), vec![("Foo", 0, 0, None)]);
    }

    #[test]
    fn malformed_counts_keep_whole_line() {
        let routes = parse("Foo 12abc\nBar (x)\n(7)\nBaz 99999999999");
        assert_eq!(
            shape(&routes),
            vec![
                ("Foo 12abc", 0, 0, None),
                ("Bar (x)", 0, 1, None),
                ("(7)", 0, 2, None),
                ("Baz 99999999999", 0, 3, None),
            ]
        );
    }

    #[test]
    fn blank_lines_are_skipped_and_order_is_dense() {
        let routes = parse("\n  Katsu 5 \r\n\n\tSeirei (8)\n   \n");
        assert_eq!(
            shape(&routes),
            vec![("Katsu", 5, 0, None), ("Seirei", 8, 1, None)]
        );
        assert_eq!(routes[0].id, "route-0");
        assert_eq!(routes[1].id, "route-1");
    }

    #[test]
    fn parenthesized_suffix_wins_over_inner_numbers() {
        assert_eq!(
            shape(&parse("Area 2 (3)")),
            vec![("Area 2", 3, 0, None)]
        );
    }

    #[test]
    fn child_lines_take_the_group_below() {
        let routes = parse("-Child1(1)\n{Group(3)}Child2(2)");
        assert_eq!(
            shape(&routes),
            vec![
                ("Child1", 1, 0, Some("Group")),
                ("Child2", 2, 1, Some("Group")),
            ]
        );
    }

    #[test]
    fn child_after_last_group_marker_is_ungrouped() {
        let routes = parse("{Group(3)}Child1(1)\n-Child2(2)");
        assert_eq!(
            shape(&routes),
            vec![("Child1", 1, 0, Some("Group")), ("Child2", 2, 1, None)]
        );
    }

    #[test]
    fn multiple_groups_are_assigned_block_by_block() {
        let text = "-a 1\n-b 2\n{Mondstadt 3}c 3\n-d (4)\n{Liyue}e\nTail 9";
        let routes = parse(text);
        assert_eq!(
            shape(&routes),
            vec![
                ("a", 1, 0, Some("Mondstadt")),
                ("b", 2, 1, Some("Mondstadt")),
                ("c", 3, 2, Some("Mondstadt")),
                ("d", 4, 3, Some("Liyue")),
                ("e", 0, 4, Some("Liyue")),
                ("Tail", 9, 5, None),
            ]
        );
    }

    #[test]
    fn plain_lines_do_not_move_the_cursor() {
        let routes = parse("-a\nloose 2\n{G}b");
        assert_eq!(
            shape(&routes),
            vec![("a", 0, 0, Some("G")), ("loose", 2, 1, None), ("b", 0, 2, Some("G"))]
        );
    }

    #[test]
    fn empty_group_remainder_yields_no_route() {
        let routes = parse("-a 1\n{Only Group}");
        assert_eq!(shape(&routes), vec![("a", 1, 0, Some("Only Group"))]);
    }

    #[test]
    fn both_markers_are_required_for_grouping() {
        let parser = RouteParser::default();
        assert_eq!(parser.mode_for("-a 1\n-b 2"), ParseMode::Flat);
        assert_eq!(parser.mode_for("{G}a 1\nb 2"), ParseMode::Flat);
        assert_eq!(parser.mode_for("-a\n{G}b"), ParseMode::Grouped);

        let routes = parse("-a 1\n-b 2");
        assert_eq!(shape(&routes), vec![("-a", 1, 0, None), ("-b", 2, 1, None)]);
    }

    #[test]
    fn custom_markers_are_honoured() {
        let parser = RouteParser::new(ParserConfig {
            child_marker: '*',
            group_open: '[',
            group_close: ']',
        });
        let routes = parser.parse("*a 1\n[G 2]b 3", &mut SequentialIds::default());
        assert_eq!(
            shape(&routes),
            vec![("a", 1, 0, Some("G")), ("b", 3, 1, Some("G"))]
        );
    }

    #[test]
    fn validate_rejects_colliding_markers() {
        let config = ParserConfig {
            child_marker: '{',
            ..ParserConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateMarker { marker: '{', .. })
        ));
        let config = ParserConfig {
            group_close: ' ',
            ..ParserConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMarker { .. })
        ));
        assert!(ParserConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("\n \n\t").is_empty());
    }
}
