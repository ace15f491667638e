//! Derived display text for text-bearing widgets.
//!
//! Evaluation is a pure read of the node plus the supplied wall-clock time;
//! the editor's ticker calls it once per interval and caches the result.

use crate::model::{ClockContent, Content, DateContent, Node, TextContent};
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDateTime, Timelike};
use std::fmt::Write;
use winnow::combinator::{alt, repeat};
use winnow::prelude::*;
use winnow::token::take;

/// Shown when a date pattern cannot be formatted.
pub const FORMAT_ERROR: &str = "Error";

/// Sample readings substituted into text widgets while editing.
pub const PLACEHOLDERS: [(&str, &str); 3] = [("{cpu}", "15%"), ("{ram}", "4GB"), ("{bat}", "80%")];

// ─── Clock format ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockToken<'a> {
    Hour,
    Minute,
    Second,
    Literal(&'a str),
}

fn parse_clock_token<'a>(input: &mut &'a str) -> ModalResult<ClockToken<'a>> {
    alt((
        "HH".value(ClockToken::Hour),
        "mm".value(ClockToken::Minute),
        "ss".value(ClockToken::Second),
        take(1usize).map(ClockToken::Literal),
    ))
    .parse_next(input)
}

fn parse_clock_format<'a>(input: &mut &'a str) -> ModalResult<Vec<ClockToken<'a>>> {
    repeat(0.., parse_clock_token).parse_next(input)
}

/// Render a clock pattern (`HH`, `mm`, `ss`, anything else literal).
pub fn format_clock(format: &str, now: &NaiveDateTime) -> String {
    let Ok(tokens) = parse_clock_format.parse(format) else {
        return format.to_string();
    };
    let mut out = String::with_capacity(format.len());
    for token in tokens {
        match token {
            ClockToken::Hour => {
                let _ = write!(out, "{:02}", now.hour());
            }
            ClockToken::Minute => {
                let _ = write!(out, "{:02}", now.minute());
            }
            ClockToken::Second => {
                let _ = write!(out, "{:02}", now.second());
            }
            ClockToken::Literal(s) => out.push_str(s),
        }
    }
    out
}

// ─── Date format ─────────────────────────────────────────────────────────

/// Render a strftime pattern; unknown specifiers yield [`FORMAT_ERROR`].
pub fn format_date(format: &str, now: &NaiveDateTime) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return FORMAT_ERROR.to_string();
    }
    let mut out = String::new();
    match write!(out, "{}", now.format_with_items(items.into_iter())) {
        Ok(()) => out,
        // e.g. `%z` has no offset to print on a naive timestamp
        Err(_) => FORMAT_ERROR.to_string(),
    }
}

/// Substitute the sample `{cpu}`/`{ram}`/`{bat}` readings.
pub fn expand_placeholders(text: &str) -> String {
    PLACEHOLDERS
        .iter()
        .fold(text.to_string(), |acc, (key, sample)| acc.replace(key, sample))
}

/// Local wall-clock time, as clock and date widgets display it.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// The text a renderer should draw for `node` at `now`, or `None` for
/// widgets without text.
pub fn display_text(node: &Node, now: &NaiveDateTime) -> Option<String> {
    match &node.content {
        Content::Text(TextContent { text, .. }) => Some(expand_placeholders(text)),
        Content::Clock(ClockContent { format, .. }) => Some(format_clock(format, now)),
        Content::Date(DateContent { format, .. }) => Some(format_date(format, now)),
        Content::Empty(_) | Content::Progress(_) => None,
    }
}
