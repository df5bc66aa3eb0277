// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of relative time expressions to absolute date ranges.
//!
//! "last quarter" said in August 2026 must mean Q2 2026 whether it was said
//! in English or Arabic; all ranges are computed against the clock the
//! caller injects, never against a clock read here.

use bayan_core::types::{TimeGrain, TimeRange};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Relative expressions mapped to (period, offset-from-current) in both
/// languages. Offset 0 = current period, 1 = previous.
const RELATIVE_PATTERNS: &[(&str, TimeGrain, i32)] = &[
    ("last quarter", TimeGrain::Quarter, 1),
    ("previous quarter", TimeGrain::Quarter, 1),
    ("this quarter", TimeGrain::Quarter, 0),
    ("current quarter", TimeGrain::Quarter, 0),
    ("last month", TimeGrain::Month, 1),
    ("previous month", TimeGrain::Month, 1),
    ("this month", TimeGrain::Month, 0),
    ("current month", TimeGrain::Month, 0),
    ("last year", TimeGrain::Year, 1),
    ("previous year", TimeGrain::Year, 1),
    ("this year", TimeGrain::Year, 0),
    ("current year", TimeGrain::Year, 0),
    ("الربع الماضي", TimeGrain::Quarter, 1),
    ("الربع السابق", TimeGrain::Quarter, 1),
    ("الربع الحالي", TimeGrain::Quarter, 0),
    ("هذا الربع", TimeGrain::Quarter, 0),
    ("الشهر الماضي", TimeGrain::Month, 1),
    ("الشهر السابق", TimeGrain::Month, 1),
    ("هذا الشهر", TimeGrain::Month, 0),
    ("الشهر الحالي", TimeGrain::Month, 0),
    ("السنة الماضية", TimeGrain::Year, 1),
    ("العام الماضي", TimeGrain::Year, 1),
    ("هذه السنة", TimeGrain::Year, 0),
    ("هذا العام", TimeGrain::Year, 0),
];

/// Normalize a time expression in the utterance to an absolute range.
///
/// Checks relative expressions first ("last quarter", "الشهر الماضي"), then
/// explicit quarters ("q3 2025", "q3" = the current year's), then a bare
/// four-digit year. Returns `None` when the utterance carries no time
/// expression; the caller decides what an unbounded query means.
pub fn normalize(utterance: &str, now: DateTime<Utc>) -> Option<TimeRange> {
    let lower = utterance.to_lowercase();
    let today = now.date_naive();

    for (pattern, grain, offset) in RELATIVE_PATTERNS {
        if lower.contains(pattern) {
            return Some(relative_range(today, *grain, *offset));
        }
    }

    if let Some(range) = explicit_quarter(&lower, today) {
        return Some(range);
    }

    bare_year(&lower).map(year_range)
}

fn relative_range(today: NaiveDate, grain: TimeGrain, offset: i32) -> TimeRange {
    let current = match grain {
        TimeGrain::Month => month_range(today.year(), today.month()),
        TimeGrain::Quarter => quarter_range(today.year(), (today.month() - 1) / 3 + 1),
        TimeGrain::Year => year_range(today.year()),
    };
    if offset == 0 { current } else { current.previous() }
}

/// Match "q1".."q4", optionally followed by a year ("q3 2025").
fn explicit_quarter(lower: &str, today: NaiveDate) -> Option<TimeRange> {
    for q in 1..=4u32 {
        let tag = format!("q{q}");
        let Some(pos) = find_word(lower, &tag) else {
            continue;
        };
        let rest = &lower[pos + tag.len()..];
        let year = rest
            .split_whitespace()
            .next()
            .map(|tok| tok.trim_matches(|c: char| !c.is_ascii_digit()))
            .filter(|tok| tok.len() == 4)
            .and_then(|tok| tok.parse::<i32>().ok())
            .filter(|y| (2000..=2100).contains(y))
            .unwrap_or(today.year());
        return Some(quarter_range(year, q));
    }
    None
}

/// A standalone four-digit year anywhere in the utterance. Digit runs glued
/// to letters or longer numbers ("bbq2000", "20261") do not count.
fn bare_year(lower: &str) -> Option<i32> {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| tok.len() == 4 && tok.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|tok| tok.parse::<i32>().ok())
        .find(|y| (2000..=2100).contains(y))
}

/// Find `word` at word boundaries (not inside a longer alphanumeric token).
fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(rel) = haystack[search_from..].find(word) {
        let pos = search_from + rel;
        let before_ok = !haystack[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        let after_ok = !haystack[pos + word.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(pos);
        }
        search_from = pos + word.len();
    }
    None
}

fn month_range(year: i32, month: u32) -> TimeRange {
    TimeRange {
        start: first_of(year, month),
        end: last_of(year, month),
        grain: TimeGrain::Month,
    }
}

fn quarter_range(year: i32, quarter: u32) -> TimeRange {
    let first_month = (quarter - 1) * 3 + 1;
    TimeRange {
        start: first_of(year, first_month),
        end: last_of(year, first_month + 2),
        grain: TimeGrain::Quarter,
    }
}

fn year_range(year: i32) -> TimeRange {
    TimeRange {
        start: first_of(year, 1),
        end: last_of(year, 12),
        grain: TimeGrain::Year,
    }
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of(year: i32, month: u32) -> NaiveDate {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    first_of(ny, nm).pred_opt().unwrap_or(NaiveDate::MIN)
}
