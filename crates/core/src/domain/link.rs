use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Form,
    Folder,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Folder => "folder",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "form" => Ok(Self::Form),
            "folder" => Ok(Self::Folder),
            other => Err(DomainError::InvariantViolation(format!("unknown link kind `{other}`"))),
        }
    }
}

/// One archived link. `url` is the unique key of the archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub captured_at: DateTime<Utc>,
    pub submitter: String,
    pub title: Option<String>,
    pub kind: LinkKind,
}

impl LinkRecord {
    pub fn mirror_row(&self) -> MirrorRow {
        MirrorRow {
            time: self.captured_at.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
            title: self.title.clone().unwrap_or_default(),
            author: self.submitter.clone(),
            kind: self.kind.as_str().to_owned(),
            url: self.url.clone(),
        }
    }
}

/// Spreadsheet projection of a [`LinkRecord`], in column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRow {
    pub time: String,
    pub title: String,
    pub author: String,
    pub kind: String,
    pub url: String,
}

impl MirrorRow {
    pub fn cells(&self) -> [&str; 5] {
        [&self.time, &self.title, &self.author, &self.kind, &self.url]
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{LinkKind, LinkRecord};

    #[test]
    fn mirror_row_keeps_sheet_column_order() {
        let record = LinkRecord {
            url: "https://forms.gle/abc123".to_owned(),
            captured_at: Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 5).unwrap(),
            submitter: "quizmaster".to_owned(),
            title: Some("Round 4: Geography".to_owned()),
            kind: LinkKind::Form,
        };

        let row = record.mirror_row();

        assert_eq!(
            row.cells(),
            [
                "2024-03-01 19:30:05+00:00",
                "Round 4: Geography",
                "quizmaster",
                "form",
                "https://forms.gle/abc123"
            ]
        );
    }

    #[test]
    fn missing_title_mirrors_as_empty_cell() {
        let record = LinkRecord {
            url: "https://drive.google.com/drive/folders/xyz?usp=sharing".to_owned(),
            captured_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            submitter: "host".to_owned(),
            title: None,
            kind: LinkKind::Folder,
        };

        assert_eq!(record.mirror_row().title, "");
        assert_eq!(record.mirror_row().kind, "folder");
    }

    #[test]
    fn link_kind_parses_case_insensitively() {
        assert_eq!(" FORM ".parse::<LinkKind>().expect("form"), LinkKind::Form);
        assert!("spreadsheet".parse::<LinkKind>().is_err());
    }
}
