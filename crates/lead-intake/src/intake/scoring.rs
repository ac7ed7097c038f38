//! Priority scoring and SLA deadlines.
//!
//! Deterministic functions of the pest description and urgency tier, applied
//! once at lead creation and never recomputed, so historical leads keep the
//! scoring rules that were live when they arrived.

use chrono::{DateTime, Duration, Utc};

use super::domain::Urgency;

/// Pest classes in fixed priority order; the first class with a matching
/// term wins. Terms cover the French site copy plus Dutch/English synonyms
/// so both site languages score identically.
const PEST_CLASSES: [(&[&str], u32); 7] = [
    (&["punaise", "bedwants", "bedbug", "bed bug"], 90),
    (&["cafard", "blatte", "kakkerlak", "cockroach"], 85),
    (&["rat"], 80),
    (&["guepe", "gu\u{ea}pe", "frelon", "wesp", "wasp", "hornet"], 70),
    (&["souris", "muis", "mouse"], 60),
    (&["fourmi", "mieren"], 45),
    (&["pigeon", "duif"], 40),
];

const DEFAULT_BASE_SCORE: u32 = 30;

impl Urgency {
    /// Priority multiplier in tenths (1.3, 1.0, 0.7). Kept as an integer so
    /// `45 * 0.7` rounds to 32; the f64 product is 31.4999... and would
    /// round down.
    pub fn priority_multiplier_tenths(self) -> u32 {
        match self {
            Urgency::Immediate => 13,
            Urgency::H48 => 10,
            Urgency::Inspection => 7,
        }
    }

    /// Wall-clock response offset; not business-hours-aware.
    pub fn sla_offset(self) -> Duration {
        match self {
            Urgency::Immediate => Duration::hours(2),
            Urgency::H48 => Duration::hours(12),
            Urgency::Inspection => Duration::hours(48),
        }
    }
}

/// Base score for the lowercased pest description.
pub fn pest_base_score(pest_detail: &str) -> u32 {
    let detail = pest_detail.to_lowercase();
    PEST_CLASSES
        .iter()
        .find(|(terms, _)| terms.iter().any(|term| detail.contains(term)))
        .map(|(_, score)| *score)
        .unwrap_or(DEFAULT_BASE_SCORE)
}

/// Final priority score: `round(base * multiplier)`, half rounding up.
pub fn priority_score(pest_detail: &str, urgency: Urgency) -> u32 {
    (pest_base_score(pest_detail) * urgency.priority_multiplier_tenths() + 5) / 10
}

/// SLA deadline relative to the submission time.
pub fn sla_due_at(urgency: Urgency, submitted_at: DateTime<Utc>) -> DateTime<Utc> {
    submitted_at + urgency.sla_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rats_immediate_scores_104() {
        assert_eq!(priority_score("rats", Urgency::Immediate), 104);
    }

    #[test]
    fn ants_inspection_scores_32() {
        assert_eq!(priority_score("fourmis", Urgency::Inspection), 32);
    }

    #[test]
    fn first_matching_class_wins() {
        // Mentions both bedbugs and mice; the bedbug class is checked first.
        assert_eq!(pest_base_score("punaises et souris"), 90);
    }

    #[test]
    fn unknown_pest_falls_back_to_default() {
        assert_eq!(pest_base_score("taupes dans le jardin"), 30);
        assert_eq!(priority_score("taupes dans le jardin", Urgency::H48), 30);
    }

    #[test]
    fn matching_is_case_insensitive_across_languages() {
        assert_eq!(pest_base_score("KAKKERLAKKEN in de keuken"), 85);
        assert_eq!(pest_base_score("Cafards"), 85);
    }

    #[test]
    fn immediate_sla_is_exactly_two_hours_out() {
        // Sampled around the Brussels DST transitions; UTC arithmetic must
        // stay exact to the second regardless.
        let samples = [
            Utc.with_ymd_and_hms(2025, 3, 30, 0, 30, 0).single(),
            Utc.with_ymd_and_hms(2025, 3, 30, 1, 59, 59).single(),
            Utc.with_ymd_and_hms(2025, 10, 26, 0, 15, 0).single(),
            Utc.with_ymd_and_hms(2025, 10, 26, 23, 45, 12).single(),
            Utc.with_ymd_and_hms(2025, 6, 15, 14, 3, 21).single(),
        ];
        for submitted_at in samples.into_iter().flatten() {
            let due = sla_due_at(Urgency::Immediate, submitted_at);
            assert_eq!(due - submitted_at, Duration::hours(2));
            assert_eq!(
                due.timestamp(),
                submitted_at.timestamp() + 2 * 3600,
                "submission at {submitted_at}"
            );
        }
    }

    #[test]
    fn sla_offsets_follow_urgency_tier() {
        let now = Utc::now();
        assert_eq!(sla_due_at(Urgency::H48, now) - now, Duration::hours(12));
        assert_eq!(
            sla_due_at(Urgency::Inspection, now) - now,
            Duration::hours(48)
        );
    }
}
