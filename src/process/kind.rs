// src/process/kind.rs

//! Column semantics inferred from display names.
//!
//! The upstream API carries no types we can trust, so a column is treated as
//! temporal or numeric when its name contains one of the keywords below
//! (case-insensitive substring match). A name may hit both lists.

pub const TEMPORAL_KEYWORDS: &[&str] = &["date", "day", "when", "created", "modified", "time"];

pub const NUMERIC_KEYWORDS: &[&str] = &[
    "hour", "time", "duration", "amount", "cost", "rate", "total",
];

/// Subset of the numeric keywords naming worked time; picks the hour column for metrics.
pub const HOUR_KEYWORDS: &[&str] = &["hour", "time", "duration"];

pub const CATEGORY_KEYWORDS: &[&str] = &["project", "client", "task", "category"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Temporal,
    Numeric,
    Textual,
}

/// Which keyword tables a column name matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnKinds {
    pub temporal: bool,
    pub numeric: bool,
}

impl ColumnKinds {
    /// Temporal wins when both lists match, mirroring the order the cleaner applies them.
    pub fn primary(self) -> ColumnKind {
        if self.temporal {
            ColumnKind::Temporal
        } else if self.numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Textual
        }
    }

    /// Both the temporal and the numeric pass will run on this column.
    pub fn overlapping(self) -> bool {
        self.temporal && self.numeric
    }
}

pub fn classify(name: &str) -> ColumnKinds {
    ColumnKinds {
        temporal: matches_any(name, TEMPORAL_KEYWORDS),
        numeric: matches_any(name, NUMERIC_KEYWORDS),
    }
}

pub fn is_categorical(name: &str) -> bool {
    matches_any(name, CATEGORY_KEYWORDS)
}

pub fn matches_any(name: &str, keywords: &[&str]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive_substring() {
        assert_eq!(classify("Work DATE").primary(), ColumnKind::Temporal);
        assert_eq!(classify("Hours").primary(), ColumnKind::Numeric);
        assert_eq!(classify("Billable Amount").primary(), ColumnKind::Numeric);
        assert_eq!(classify("Notes").primary(), ColumnKind::Textual);
        assert_eq!(classify("Notes"), ColumnKinds::default());
    }

    #[test]
    fn time_hits_both_tables() {
        let kinds = classify("Time Logged");
        assert!(kinds.temporal);
        assert!(kinds.numeric);
        assert!(kinds.overlapping());
        assert_eq!(kinds.primary(), ColumnKind::Temporal);

        // "Workday Hours" also collides via "day".
        assert!(classify("Workday Hours").overlapping());
    }

    #[test]
    fn categorical_names() {
        assert!(is_categorical("Client Name"));
        assert!(is_categorical("TASK"));
        assert!(!is_categorical("Hours"));
    }

    #[test]
    fn billing_columns_are_numeric_but_not_hours() {
        assert!(classify("Rate").numeric);
        assert!(!matches_any("Rate", HOUR_KEYWORDS));
        assert!(!matches_any("Total Cost", HOUR_KEYWORDS));
        assert!(matches_any("Duration (h)", HOUR_KEYWORDS));
    }
}
