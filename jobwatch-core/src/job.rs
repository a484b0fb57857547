use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single listing returned by the job search endpoint.
///
/// Only `title` and `date_created` are interpreted; every other field the API
/// sends is carried through `extra` untouched so the cache keeps the full record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub title: String,
    pub date_created: String,
    #[serde(skip)]
    pub is_new: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn new(title: impl Into<String>, date_created: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date_created: date_created.into(),
            is_new: false,
            extra: Map::new(),
        }
    }

    /// Two records describe the same listing when title and creation stamp match exactly.
    pub fn same_listing(&self, other: &Job) -> bool {
        self.title == other.title && self.date_created == other.date_created
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.date_created.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// The configured search, stored under `feeds`.
///
/// Older stores hold a bare query string; newer ones an object with an explicit id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "FeedQueryRepr")]
pub struct FeedQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedQueryRepr {
    Bare(String),
    Full {
        query: String,
        #[serde(default)]
        id: Option<String>,
    },
}

impl From<FeedQueryRepr> for FeedQuery {
    fn from(repr: FeedQueryRepr) -> Self {
        match repr {
            FeedQueryRepr::Bare(query) => FeedQuery { query, id: None },
            FeedQueryRepr::Full { query, id } => FeedQuery { query, id },
        }
    }
}

impl FeedQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            id: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Key and title used for system notifications about this feed.
    pub fn identifier(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("{}:", self.query),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessCredential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl AccessCredential {
    pub fn is_present(&self) -> bool {
        !self.access_token.is_empty()
    }
}
