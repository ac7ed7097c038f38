//! Bot/abuse heuristics for intake submissions.
//!
//! Independent signals add points into a 0-100 suspicion score; a submission
//! is flagged at [`SPAM_THRESHOLD`]. The same signal set backs both entry
//! points: [`precheck`] is the advisory pre-submit evaluation and never
//! decides storage, [`check_submission`] is the authoritative server check
//! that alone decides whether a lead lands as `SPAM`.
//!
//! The timing signal fires whenever a form-start timestamp is available: the
//! client always has one, the server only when the payload forwards
//! `form_started_at`. The repeated-character run length is 6 on both sides.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::IntakePayload;
use super::validation;

/// Score at or above which a submission is treated as spam.
pub const SPAM_THRESHOLD: u8 = 50;

const MAX_SCORE: u8 = 100;

/// Submissions finished faster than this many seconds score [`SpamSignal::TooFast`].
const FAST_FILL_SECS: i64 = 6;
/// Submissions finished faster than this score [`SpamSignal::SuspiciouslyFast`].
const QUICK_FILL_SECS: i64 = 15;

/// Identical consecutive characters at or beyond this run length are flagged.
const REPEAT_RUN_LEN: usize = 6;

const SPAM_KEYWORDS: [&str; 11] = [
    "bitcoin",
    "crypto",
    "casino",
    "viagra",
    "lottery",
    "winner",
    "congratulations",
    "click here",
    "free money",
    "make money",
    "work from home",
];

/// One triggered heuristic. Serialized names land in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamSignal {
    HoneypotFilled,
    TooFast,
    SuspiciouslyFast,
    ContainsUrl,
    SpamKeyword,
    RepeatedChars,
    NameTooShort,
    SuspiciousName,
    InvalidPhone,
    InvalidPostal,
}

impl SpamSignal {
    pub fn weight(self) -> u8 {
        match self {
            Self::HoneypotFilled => 50,
            Self::TooFast => 40,
            Self::SuspiciouslyFast => 15,
            Self::ContainsUrl => 30,
            Self::SpamKeyword => 25,
            Self::RepeatedChars => 15,
            Self::NameTooShort => 10,
            Self::SuspiciousName => 15,
            Self::InvalidPhone => 10,
            Self::InvalidPostal => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HoneypotFilled => "honeypot_filled",
            Self::TooFast => "too_fast",
            Self::SuspiciouslyFast => "suspiciously_fast",
            Self::ContainsUrl => "contains_url",
            Self::SpamKeyword => "spam_keyword",
            Self::RepeatedChars => "repeated_chars",
            Self::NameTooShort => "name_too_short",
            Self::SuspiciousName => "suspicious_name",
            Self::InvalidPhone => "invalid_phone",
            Self::InvalidPostal => "invalid_postal",
        }
    }
}

/// Outcome of one heuristics pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamVerdict {
    /// Accumulated suspicion, capped at 100.
    pub score: u8,
    pub signals: Vec<SpamSignal>,
}

impl SpamVerdict {
    pub fn is_spam(&self) -> bool {
        self.score >= SPAM_THRESHOLD
    }

    /// Signal names for structured logging.
    pub fn reasons(&self) -> Vec<&'static str> {
        self.signals.iter().map(|s| s.as_str()).collect()
    }

    fn tally(signals: Vec<SpamSignal>) -> Self {
        let total: u32 = signals.iter().map(|s| u32::from(s.weight())).sum();
        Self {
            score: total.min(u32::from(MAX_SCORE)) as u8,
            signals,
        }
    }
}

/// Fields the heuristics look at. Both entry points build one of these.
#[derive(Debug, Clone, Copy)]
pub struct SpamInput<'a> {
    pub honeypot: Option<&'a str>,
    pub description: &'a str,
    pub name: Option<&'a str>,
    pub phone: &'a str,
    /// `None` skips the postal signal (advisory check has no authority here).
    pub postal_code: Option<&'a str>,
    /// `None` skips the timing signals.
    pub form_started_at: Option<DateTime<Utc>>,
}

/// Authoritative server-side check over a full intake payload. The only
/// evaluation trusted for the `NEW` vs `SPAM` persistence decision.
pub fn check_submission(payload: &IntakePayload, now: DateTime<Utc>) -> SpamVerdict {
    evaluate(
        &SpamInput {
            honeypot: payload.hp.as_deref(),
            description: &payload.description,
            name: payload.name.as_deref(),
            phone: &payload.phone,
            postal_code: Some(&payload.postal_code),
            form_started_at: payload.form_started_at,
        },
        now,
    )
}

/// Advisory pre-submit check. Shares the signal set with
/// [`check_submission`] minus the postal signal; never trusted for storage
/// decisions.
pub fn precheck(
    description: &str,
    name: &str,
    phone: &str,
    honeypot: Option<&str>,
    form_started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SpamVerdict {
    evaluate(
        &SpamInput {
            honeypot,
            description,
            name: Some(name),
            phone,
            postal_code: None,
            form_started_at: Some(form_started_at),
        },
        now,
    )
}

fn evaluate(input: &SpamInput<'_>, now: DateTime<Utc>) -> SpamVerdict {
    let mut signals = Vec::new();

    if input
        .honeypot
        .map(|hp| !hp.trim().is_empty())
        .unwrap_or(false)
    {
        signals.push(SpamSignal::HoneypotFilled);
    }

    if let Some(started_at) = input.form_started_at {
        let elapsed = now.signed_duration_since(started_at).num_seconds();
        if elapsed < FAST_FILL_SECS {
            signals.push(SpamSignal::TooFast);
        } else if elapsed < QUICK_FILL_SECS {
            signals.push(SpamSignal::SuspiciouslyFast);
        }
    }

    let description = input.description.to_lowercase();

    if contains_url(&description) {
        signals.push(SpamSignal::ContainsUrl);
    }

    if SPAM_KEYWORDS.iter().any(|kw| description.contains(kw)) || contains_cyrillic(&description) {
        signals.push(SpamSignal::SpamKeyword);
    }

    if has_repeated_run(&description, REPEAT_RUN_LEN) {
        signals.push(SpamSignal::RepeatedChars);
    }

    if let Some(name) = input.name {
        if name.trim().chars().count() < 2 {
            signals.push(SpamSignal::NameTooShort);
        }
        if has_gibberish_vowel_ratio(name) {
            signals.push(SpamSignal::SuspiciousName);
        }
    }

    let phone_digits = input.phone.chars().filter(|c| c.is_ascii_digit()).count();
    if phone_digits < 9 {
        signals.push(SpamSignal::InvalidPhone);
    }

    if let Some(postal) = input.postal_code {
        if validation::validate_belgian_postal_code(postal).is_err() {
            signals.push(SpamSignal::InvalidPostal);
        }
    }

    SpamVerdict::tally(signals)
}

fn contains_url(description: &str) -> bool {
    description.contains("http://") || description.contains("https://") || description.contains("www.")
}

/// Cyrillic script is a strong spam marker on a FR/NL-only site.
fn contains_cyrillic(description: &str) -> bool {
    description.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

fn has_repeated_run(text: &str, run_len: usize) -> bool {
    let mut last: Option<char> = None;
    let mut run = 0usize;
    for c in text.chars() {
        if Some(c) == last {
            run += 1;
        } else {
            last = Some(c);
            run = 1;
        }
        if run >= run_len {
            return true;
        }
    }
    false
}

/// Names that are nearly all consonants or all vowels read as gibberish.
fn has_gibberish_vowel_ratio(name: &str) -> bool {
    let letters: Vec<char> = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    if letters.len() <= 3 {
        return false;
    }
    let vowels = letters
        .iter()
        .filter(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
        .count();
    let ratio = vowels as f64 / letters.len() as f64;
    ratio < 0.1 || ratio > 0.8
}
