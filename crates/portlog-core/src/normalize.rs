//! Reassembles numbered narrative entries that wrap across physical lines,
//! while passing tabular sections through untouched.
//!
//! The normalizer is a two-state machine:
//!
//! | state    | input                                   | action                          | next     |
//! |----------|-----------------------------------------|---------------------------------|----------|
//! | Merging  | line starts with a heading keyword      | flush buffer, emit line         | Verbatim |
//! | Merging  | serial prefix (`1. `, `12. `)           | flush buffer, open new buffer   | Merging  |
//! | Merging  | other line, buffer open                 | append to buffer                | Merging  |
//! | Merging  | other line, no buffer                   | emit line                       | Merging  |
//! | Verbatim | any line                                | emit line                       | Verbatim |
//!
//! End of input flushes any open buffer.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::NormalizerConfig;

static SERIAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}\.\s").expect("valid serial prefix regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

const APOSTROPHE_VARIANTS: &[char] = &['\u{2019}', '\u{2018}', '\u{02BC}', '\u{00B4}', '`'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Merging,
    Verbatim,
}

/// What the state machine decided to do with one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnterVerbatim,
    OpenEntry,
    Continue,
    Standalone,
    PassThrough,
}

pub struct LineNormalizer {
    heading_keywords: Vec<String>,
    state: MergeState,
    buffer: Option<String>,
    output: Vec<String>,
}

impl LineNormalizer {
    #[must_use]
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            heading_keywords: config
                .heading_keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .collect(),
            state: MergeState::Merging,
            buffer: None,
            output: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> MergeState {
        self.state
    }

    fn is_heading(&self, line: &str) -> bool {
        let upper = line.to_uppercase();
        self.heading_keywords.iter().any(|k| upper.starts_with(k.as_str()))
    }

    /// Classify a line against the transition table without consuming it.
    #[must_use]
    pub fn classify(&self, line: &str) -> Transition {
        match self.state {
            MergeState::Verbatim => Transition::PassThrough,
            MergeState::Merging if self.is_heading(line) => Transition::EnterVerbatim,
            MergeState::Merging if SERIAL_PREFIX.is_match(line) => Transition::OpenEntry,
            MergeState::Merging if self.buffer.is_some() => Transition::Continue,
            MergeState::Merging => Transition::Standalone,
        }
    }

    pub fn push(&mut self, line: &str) {
        let transition = self.classify(line);
        tracing::trace!(?transition, line, "normalizer step");

        match transition {
            Transition::EnterVerbatim => {
                self.flush();
                self.emit(line.to_string());
                self.state = MergeState::Verbatim;
                tracing::debug!(line, "heading detected, switching to verbatim mode");
            }
            Transition::OpenEntry => {
                self.flush();
                self.buffer = Some(line.to_string());
            }
            Transition::Continue => {
                if let Some(buffer) = self.buffer.as_mut() {
                    buffer.push(' ');
                    buffer.push_str(line);
                }
            }
            Transition::Standalone | Transition::PassThrough => self.emit(line.to_string()),
        }
    }

    fn flush(&mut self) {
        if let Some(entry) = self.buffer.take() {
            self.emit(entry);
        }
    }

    fn emit(&mut self, line: String) {
        self.output.push(clean_line(&line));
    }

    #[must_use]
    pub fn finish(mut self) -> Vec<String> {
        self.flush();
        self.output
    }

    /// Run the whole machine over a line sequence.
    pub fn normalize<I, S>(config: &NormalizerConfig, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalizer = Self::new(config);
        for line in lines {
            normalizer.push(line.as_ref());
        }
        normalizer.finish()
    }
}

/// Collapse whitespace runs and map typographic apostrophes to `'`.
#[must_use]
pub fn clean_line(line: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(line, " ");
    collapsed.replace(APOSTROPHE_VARIANTS, "'")
}
