use serde::{Deserialize, Serialize};
use serde_json::Value;

mod author;
mod subject;
mod work;

pub use author::ResolvedAuthor;
pub use subject::{normalize_subject, ReaderProfile, SharedSubject, SubjectProfile, SubjectWeights};
pub use work::{most_recent_in_window, parse_year, Description, RecommendedWork};

// ============================================================================
// Open Library API Types
// ============================================================================

/// Response from `/search/authors.json`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorSearchResponse {
    #[serde(default)]
    pub docs: Vec<AuthorCandidate>,
}

/// One author search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorCandidate {
    #[serde(default)]
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub work_count: u32,
}

/// Response from `/authors/{key}/works.json`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorWorksResponse {
    #[serde(default)]
    pub entries: Vec<AuthorWork>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorWork {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// Response from `/subjects/{subject}.json`
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectWorksResponse {
    #[serde(default)]
    pub works: Vec<SubjectWork>,
}

/// A work listed under a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectWork {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<WorkAuthor>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub publish_date: Option<PublishDates>,
}

impl SubjectWork {
    /// Every year the listing itself carries
    pub fn own_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = match &self.publish_date {
            Some(PublishDates::One(date)) => parse_year(date).into_iter().collect(),
            Some(PublishDates::Many(dates)) => dates.iter().filter_map(|d| parse_year(d)).collect(),
            None => Vec::new(),
        };
        years.extend(self.first_publish_year);
        years
    }

    pub fn author_names(&self) -> Vec<String> {
        self.authors.iter().map(|a| a.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// `publish_date` shows up both as a single string and as a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishDates {
    One(String),
    Many(Vec<String>),
}

/// Response from `/works/{key}/editions.json`
#[derive(Debug, Clone, Deserialize)]
pub struct EditionsResponse {
    #[serde(default)]
    pub entries: Vec<Edition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edition {
    #[serde(default)]
    pub publish_date: Option<String>,
}

impl Edition {
    pub fn year(&self) -> Option<i32> {
        self.publish_date.as_deref().and_then(parse_year)
    }
}

/// Response from `/works/{key}.json`, reduced to the polymorphic description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkDetail {
    #[serde(default)]
    pub description: Option<Value>,
}

impl WorkDetail {
    pub fn description(&self) -> Description {
        Description::from_value(self.description.as_ref())
    }
}
