//! Line-by-line event parsing with carried-forward date, weekday and end-time
//! context.

use std::ops::Range;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ParserConfig;
use crate::error::Error;

/// Placeholder for a date, time or name that could not be determined.
pub const NULL: &str = "NULL";

/// Start time used for the first single-timestamp line of a document.
pub const MIDNIGHT: &str = "00:00";

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[./-](\d{1,2})[./-](\d{4}|\d{2})\b").expect("valid date regex")
});

static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(MON(?:DAY)?|TUE(?:SDAY)?|WED(?:NESDAY)?|THU(?:RSDAY)?|FRI(?:DAY)?|SAT(?:URDAY)?|SUN(?:DAY)?)\b",
    )
    .expect("valid weekday regex")
});

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{4})(?:hrs?|h)?\s*[-|]\s*(\d{4})(?:hrs?|h)?\b")
        .expect("valid time range regex")
});

static FOUR_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{4})(?:hrs?|h)?\b").expect("valid time regex"));

static HOURS_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhrs?\b").expect("valid hours regex"));

static SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}\.\s").expect("valid serial regex"));

static SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// How the start of a line carrying a single timestamp is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleTimePolicy {
    /// Start where the previous event ended, or at midnight for the first one.
    #[default]
    ChainPreviousEnd,
    /// Leave the start time unknown.
    Unchained,
}

impl SingleTimePolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChainPreviousEnd => "chain_previous_end",
            Self::Unchained => "unchained",
        }
    }
}

impl FromStr for SingleTimePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "chain_previous_end" | "chain" | "chained" => Ok(Self::ChainPreviousEnd),
            "unchained" | "none" => Ok(Self::Unchained),
            other => Err(Error::Config(format!("unknown single-time policy: {other}"))),
        }
    }
}

impl std::fmt::Display for SingleTimePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sticky values carried from one line to the next within a single document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    pub last_date: Option<String>,
    pub last_day: Option<String>,
    pub last_end_time: Option<String>,
}

impl ParseContext {
    /// The joined `date weekday` label, or `"NULL"` when neither is known yet.
    #[must_use]
    pub fn date_label(&self) -> String {
        let joined = format!(
            "{} {}",
            self.last_date.as_deref().unwrap_or_default(),
            self.last_day.as_deref().unwrap_or_default()
        );
        let joined = joined.trim();
        if joined.is_empty() {
            NULL.to_string()
        } else {
            joined.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sequence_number: usize,
    #[serde(rename = "eventName")]
    pub event_name: String,
    pub date: String,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    /// Merged source line the event was read from.
    pub detail: String,
}

/// A validated `HHMM` token found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClockToken {
    pub span: Range<usize>,
    pub value: String,
}

/// `HHMM` → `HH:MM` for valid clock values (`0000`-`2359` and `2400`).
pub(crate) fn clock_value(digits: &str) -> Option<String> {
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = digits[..2].parse().ok()?;
    let minutes: u32 = digits[2..].parse().ok()?;
    let valid = (hours < 24 && minutes < 60) || (hours == 24 && minutes == 0);
    valid.then(|| format!("{}:{}", &digits[..2], &digits[2..]))
}

/// `DD/MM/YY` → `DD-MM-20YY`, zero-padding day and month.
#[must_use]
pub fn normalize_date(day: &str, month: &str, year: &str) -> String {
    let year = if year.len() == 2 {
        format!("20{year}")
    } else {
        year.to_string()
    };
    format!("{day:0>2}-{month:0>2}-{year}")
}

fn capitalize_weekday(token: &str) -> String {
    let lower = token.to_lowercase();
    let mut chars = lower.chars().take(3);
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Replace `span` with spaces so byte offsets of the rest of the line survive.
pub(crate) fn mask(text: &str, span: &Range<usize>) -> String {
    let mut masked = String::with_capacity(text.len());
    masked.push_str(&text[..span.start]);
    masked.extend(std::iter::repeat_n(' ', span.len()));
    masked.push_str(&text[span.end..]);
    masked
}

/// Finds the date token of a line, returning its span and normalized value.
pub(crate) fn find_date(line: &str) -> Option<(Range<usize>, String)> {
    DATE.captures(line).and_then(|caps| {
        let whole = caps.get(0)?;
        Some((
            whole.range(),
            normalize_date(&caps[1], &caps[2], &caps[3]),
        ))
    })
}

/// Valid 4-digit clock tokens in `text` in order of appearance.
pub(crate) fn four_digit_times(text: &str) -> Vec<ClockToken> {
    FOUR_DIGITS
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = clock_value(&caps[1])?;
            Some(ClockToken {
                span: whole.range(),
                value,
            })
        })
        .collect()
}

fn time_range(text: &str) -> Option<(Range<usize>, String, String)> {
    TIME_RANGE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let start = clock_value(&caps[1])?;
        let end = clock_value(&caps[2])?;
        Some((whole.range(), start, end))
    })
}

/// Drops the given spans from `line` and cleans what is left into a name.
fn event_name(line: &str, mut spans: Vec<Range<usize>>) -> String {
    if let Some(serial) = SERIAL.find(line) {
        spans.push(serial.range());
    }
    spans.sort_by_key(|s| s.start);

    let mut remaining = String::with_capacity(line.len());
    let mut cursor = 0;
    for span in spans {
        if span.start >= cursor {
            remaining.push_str(&line[cursor..span.start]);
            remaining.push(' ');
        }
        cursor = cursor.max(span.end);
    }
    remaining.push_str(&line[cursor..]);

    let remaining = HOURS_WORD.replace_all(&remaining, " ");
    let remaining = remaining.replace(['-', '|'], " ");
    let remaining = SPACES.replace_all(&remaining, " ");
    let name = remaining
        .trim()
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '.') || c.is_whitespace());

    if name.chars().any(char::is_alphabetic) {
        name.to_string()
    } else {
        NULL.to_string()
    }
}

pub struct EventParser {
    policy: SingleTimePolicy,
}

impl EventParser {
    #[must_use]
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            policy: config.single_time_policy,
        }
    }

    #[must_use]
    pub fn with_policy(policy: SingleTimePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> SingleTimePolicy {
        self.policy
    }

    /// Parse one document's normalized lines. Context starts empty on every
    /// call and never leaks between documents.
    pub fn parse<I, S>(&self, lines: I) -> Vec<Event>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ctx = ParseContext::default();
        let mut events = Vec::new();

        for line in lines {
            let line = line.as_ref();
            if let Some(event) = self.parse_line(&mut ctx, line, events.len() + 1) {
                tracing::debug!(
                    seq = event.sequence_number,
                    name = %event.event_name,
                    start = %event.start_time,
                    end = %event.end_time,
                    "Event parsed"
                );
                events.push(event);
            }
        }

        tracing::info!(events = events.len(), policy = %self.policy, "Event parsing complete");
        events
    }

    /// Parse a single line against `ctx`, updating the sticky values.
    pub fn parse_line(
        &self,
        ctx: &mut ParseContext,
        line: &str,
        sequence_number: usize,
    ) -> Option<Event> {
        let mut erased = Vec::new();

        let date = find_date(line);
        let searchable = match &date {
            Some((span, value)) => {
                ctx.last_date = Some(value.clone());
                erased.push(span.clone());
                mask(line, span)
            }
            None => line.to_string(),
        };

        if let Some(day) = WEEKDAY.find(&searchable) {
            ctx.last_day = Some(capitalize_weekday(day.as_str()));
            erased.push(day.range());
        }

        let (start_time, end_time) = if let Some((span, start, end)) = time_range(&searchable) {
            erased.push(span);
            (start, end)
        } else {
            let tokens = four_digit_times(&searchable);
            match tokens.as_slice() {
                [] => {
                    tracing::trace!(line, "No time token, skipping line");
                    return None;
                }
                [single] => {
                    erased.push(single.span.clone());
                    (self.single_start(ctx), single.value.clone())
                }
                [first, second, ..] => {
                    erased.extend(tokens.iter().map(|t| t.span.clone()));
                    (first.value.clone(), second.value.clone())
                }
            }
        };

        ctx.last_end_time = Some(end_time.clone());

        Some(Event {
            sequence_number,
            event_name: event_name(line, erased),
            date: ctx.date_label(),
            start_time,
            end_time,
            detail: line.to_string(),
        })
    }

    fn single_start(&self, ctx: &ParseContext) -> String {
        match self.policy {
            SingleTimePolicy::ChainPreviousEnd => ctx
                .last_end_time
                .clone()
                .unwrap_or_else(|| MIDNIGHT.to_string()),
            SingleTimePolicy::Unchained => NULL.to_string(),
        }
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::with_policy(SingleTimePolicy::default())
    }
}
