use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// How far back a bulk scan reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeScope {
    /// Messages created less than 24 hours ago.
    #[default]
    LastDay,
    FullHistory,
}

impl ScrapeScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastDay => "last_day",
            Self::FullHistory => "full_history",
        }
    }
}

impl FromStr for ScrapeScope {
    type Err = DomainError;

    /// Parses the optional argument of `??scrape`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "day" | "recent" => Ok(Self::LastDay),
            "true" | "full" | "all" | "yes" | "1" => Ok(Self::FullHistory),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown scrape scope `{other}` (expected full or nothing)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrapeSummary {
    pub forms: usize,
    pub folders: usize,
    pub inserted: usize,
    /// Matched links the archive could not store; neither inserted nor repeats.
    #[serde(default)]
    pub failed: usize,
}

impl ScrapeSummary {
    pub fn total(&self) -> usize {
        self.forms + self.folders
    }

    pub fn repeats(&self) -> usize {
        self.total().saturating_sub(self.inserted + self.failed)
    }
}

/// What happened to a single message on the live path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiveOutcome {
    /// Not a candidate: bot author, command text, or no matching link.
    Ignored,
    Inserted { url: String, title: Option<String> },
    AlreadyPresent { url: String },
}

#[cfg(test)]
mod tests {
    use super::{ScrapeScope, ScrapeSummary};

    #[test]
    fn repeats_are_total_minus_inserted() {
        let summary = ScrapeSummary { forms: 4, folders: 2, inserted: 5, failed: 0 };

        assert_eq!(summary.total(), 6);
        assert_eq!(summary.repeats(), 1);
    }

    #[test]
    fn failed_links_are_not_counted_as_repeats() {
        let summary = ScrapeSummary { forms: 4, folders: 2, inserted: 3, failed: 2 };

        assert_eq!(summary.repeats(), 1);
    }

    #[test]
    fn scrape_argument_selects_full_history() {
        for raw in ["true", "FULL", "all", " yes "] {
            assert_eq!(raw.parse::<ScrapeScope>().expect("scope"), ScrapeScope::FullHistory);
        }
        assert_eq!("".parse::<ScrapeScope>().expect("scope"), ScrapeScope::LastDay);
        assert!("sometimes".parse::<ScrapeScope>().is_err());
    }
}
