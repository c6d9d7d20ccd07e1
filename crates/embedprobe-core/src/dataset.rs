//! Paper metadata loading.
//!
//! Two JSON documents feed an experiment, each an array of paper objects:
//!
//! - the primary (filtered) dataset, where any record with a missing field is
//!   dropped at load time;
//! - the complete dataset, which is not filtered. Missing text becomes an
//!   empty string, but every record still needs a label.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// One paper with every text field resolved to a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub paper_title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub github_readme_content: String,
    pub somef_descriptions: String,
    pub github_repo_title: String,
    pub github_keywords: String,
    pub main_collection_area: String,
}

impl PaperRecord {
    /// Borrow the text of one field.
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::Title => &self.paper_title,
            TextField::Abstract => &self.abstract_text,
            TextField::Readme => &self.github_readme_content,
            TextField::SomefDescription => &self.somef_descriptions,
            TextField::GithubTitle => &self.github_repo_title,
            TextField::GithubKeywords => &self.github_keywords,
        }
    }
}

/// The text fields an experiment can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Title,
    Abstract,
    Readme,
    SomefDescription,
    GithubTitle,
    GithubKeywords,
}

impl TextField {
    /// All fields in experiment order.
    pub const ALL: [TextField; 6] = [
        TextField::Title,
        TextField::Abstract,
        TextField::Readme,
        TextField::SomefDescription,
        TextField::GithubTitle,
        TextField::GithubKeywords,
    ];

    /// Human-readable name used in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            TextField::Title => "Title",
            TextField::Abstract => "Abstract",
            TextField::Readme => "GitHub README Content",
            TextField::SomefDescription => "SOMEF descriptions",
            TextField::GithubTitle => "GitHub Title",
            TextField::GithubKeywords => "GitHub Keywords",
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which loaded dataset a field (and its labels) is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSource {
    Primary,
    Complete,
}

/// A loaded, immutable set of paper records.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    records: Vec<PaperRecord>,
}

impl Dataset {
    /// Build a dataset from already-resolved records.
    pub fn from_records(path: impl Into<PathBuf>, records: Vec<PaperRecord>) -> Self {
        Self {
            path: path.into(),
            records,
        }
    }

    /// Load the filtered dataset, dropping records with any missing field.
    pub fn load_primary(path: &Path) -> Result<Self, DatasetError> {
        let raw = read_records(path)?;
        let total = raw.len();
        let records: Vec<PaperRecord> = raw.into_iter().filter_map(RawRecord::complete).collect();

        if records.len() < total {
            tracing::info!(
                "Dropped {} of {} records with missing fields from {:?}",
                total - records.len(),
                total,
                path
            );
        }
        if records.is_empty() {
            return Err(DatasetError::Empty(path.to_path_buf()));
        }

        tracing::info!("Loaded {} records from {:?}", records.len(), path);
        Ok(Self::from_records(path, records))
    }

    /// Load the complete dataset. Missing text becomes empty; a missing label is an error.
    pub fn load_complete(path: &Path) -> Result<Self, DatasetError> {
        let raw = read_records(path)?;
        let mut records = Vec::with_capacity(raw.len());

        for (index, record) in raw.into_iter().enumerate() {
            let record = record
                .lenient()
                .ok_or_else(|| DatasetError::MissingLabel {
                    path: path.to_path_buf(),
                    index,
                })?;
            records.push(record);
        }
        if records.is_empty() {
            return Err(DatasetError::Empty(path.to_path_buf()));
        }

        tracing::info!("Loaded {} records from {:?}", records.len(), path);
        Ok(Self::from_records(path, records))
    }

    /// Source file of this dataset.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, in file order.
    pub fn records(&self) -> &[PaperRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Text of one field for every record, in record order.
    pub fn texts(&self, field: TextField) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.text(field).to_string())
            .collect()
    }

    /// Label of every record, in record order.
    pub fn labels(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.main_collection_area.clone())
            .collect()
    }
}

/// A JSON value that is either a string or a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextValue {
    Text(String),
    List(Vec<String>),
}

impl TextValue {
    fn into_text(self) -> String {
        match self {
            TextValue::Text(s) => s,
            TextValue::List(items) => items.join(", "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    paper_title: Option<TextValue>,
    #[serde(rename = "abstract")]
    abstract_text: Option<TextValue>,
    github_readme_content: Option<TextValue>,
    somef_descriptions: Option<TextValue>,
    github_repo_title: Option<TextValue>,
    github_keywords: Option<TextValue>,
    main_collection_area: Option<TextValue>,
}

impl RawRecord {
    /// All fields present, or `None`.
    fn complete(self) -> Option<PaperRecord> {
        Some(PaperRecord {
            paper_title: self.paper_title?.into_text(),
            abstract_text: self.abstract_text?.into_text(),
            github_readme_content: self.github_readme_content?.into_text(),
            somef_descriptions: self.somef_descriptions?.into_text(),
            github_repo_title: self.github_repo_title?.into_text(),
            github_keywords: self.github_keywords?.into_text(),
            main_collection_area: self.main_collection_area?.into_text(),
        })
    }

    /// Missing text defaults to empty; `None` only when the label is missing.
    fn lenient(self) -> Option<PaperRecord> {
        fn or_empty(value: Option<TextValue>) -> String {
            value.map(TextValue::into_text).unwrap_or_default()
        }

        Some(PaperRecord {
            main_collection_area: self.main_collection_area?.into_text(),
            paper_title: or_empty(self.paper_title),
            abstract_text: or_empty(self.abstract_text),
            github_readme_content: or_empty(self.github_readme_content),
            somef_descriptions: or_empty(self.somef_descriptions),
            github_repo_title: or_empty(self.github_repo_title),
            github_keywords: or_empty(self.github_keywords),
        })
    }
}

fn read_records(path: &Path) -> Result<Vec<RawRecord>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
