//! Domain DTOs for the Reader API.
//!
//! # Design
//! Fields whose zero value means something (booleans, progress, cursors,
//! timestamps) are `Option`s so "unset" and "zero" never collide. Request
//! types skip unset and empty fields when serialized, which is what gives
//! update its partial-update semantics.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::de::{lenient_count, null_as_default};
use crate::error::Error;

/// A document's reading-queue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    New,
    Later,
    Archive,
    Feed,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::New,
        Location::Later,
        Location::Archive,
        Location::Feed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::New => "new",
            Location::Later => "later",
            Location::Archive => "archive",
            Location::Feed => "feed",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|location| location.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_parameter(format!(
                    "invalid location: {s}. Valid values: new, later, archive, feed"
                ))
            })
    }
}

/// A document's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Article,
    Email,
    Rss,
    Pdf,
    Epub,
    Tweet,
    Video,
    Highlight,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Article,
        Category::Email,
        Category::Rss,
        Category::Pdf,
        Category::Epub,
        Category::Tweet,
        Category::Video,
        Category::Highlight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Article => "article",
            Category::Email => "email",
            Category::Rss => "rss",
            Category::Pdf => "pdf",
            Category::Epub => "epub",
            Category::Tweet => "tweet",
            Category::Video => "video",
            Category::Highlight => "highlight",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_parameter(format!(
                    "invalid category: {s}. Valid values: article, email, rss, pdf, epub, tweet, video, highlight"
                ))
            })
    }
}

/// A document as returned by the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Canonical Reader URL of the document.
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    /// URL the document was saved from.
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    /// Raw category; see `category()`.
    pub category: Option<String>,
    /// Raw location; see `location()`.
    pub location: Option<String>,
    pub summary: Option<String>,
    pub site_name: Option<String>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub parent_id: Option<String>,
    pub tags: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient_count")]
    pub word_count: Option<u64>,
    pub reading_progress: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub saved_at: Option<DateTime<Utc>>,
    pub first_opened_at: Option<DateTime<Utc>>,
    pub last_opened_at: Option<DateTime<Utc>>,
    pub last_moved_at: Option<DateTime<Utc>>,
    /// Only present when the list call asked for HTML content.
    pub html_content: Option<String>,
}

impl Document {
    /// The category, if it is one this crate knows.
    pub fn category(&self) -> Option<Category> {
        self.category.as_deref()?.parse().ok()
    }

    /// The location, if it is one this crate knows. Values such as
    /// `shortlist` are kept in the raw field only.
    pub fn location(&self) -> Option<Location> {
        self.location.as_deref()?.parse().ok()
    }

    /// A document counts as read once it has been opened.
    pub fn is_read(&self) -> bool {
        self.first_opened_at.is_some()
    }
}

fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Optional fields for saving a new document. The URL is passed separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    /// Document content as HTML.
    #[serde(default, skip_serializing_if = "is_unset")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub image_url: Option<String>,
    /// Top-level note attached to the document.
    #[serde(default, skip_serializing_if = "is_unset")]
    pub notes: Option<String>,
    /// Ask the service to clean the supplied HTML and parse its metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_clean_html: Option<bool>,
}

/// Fields to change on an existing document. Unset fields are left alone by
/// the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default, skip_serializing_if = "is_unset")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_clean_html: Option<bool>,
}

impl UpdateDocumentRequest {
    /// A request that only moves the document.
    pub fn move_to(location: Location) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }

    /// True when serializing would produce `{}`.
    pub fn is_empty(&self) -> bool {
        is_unset(&self.html)
            && is_unset(&self.title)
            && is_unset(&self.author)
            && is_unset(&self.summary)
            && self.published_date.is_none()
            && self.tags.is_empty()
            && self.location.is_none()
            && self.category.is_none()
            && is_unset(&self.image_url)
            && is_unset(&self.notes)
            && self.should_clean_html.is_none()
    }
}

/// Response body of the save and update endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub url: String,
}

pub type CreateDocumentResponse = DocumentRef;
pub type UpdateDocumentResponse = DocumentRef;

/// Filters and pagination for the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListDocumentsOptions {
    pub id: Option<String>,
    pub updated_after: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub category: Option<Category>,
    pub tag: Option<String>,
    pub page_cursor: Option<String>,
    /// Include `html_content` in each document. Sent only when true.
    pub with_html_content: bool,
}

impl ListDocumentsOptions {
    /// Query parameters for the options that are actually set, in a fixed
    /// order. Unset and empty options are omitted.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: String| {
            if !value.is_empty() {
                query.push((key.to_string(), value));
            }
        };

        if let Some(id) = &self.id {
            push("id", id.clone());
        }
        if let Some(updated_after) = &self.updated_after {
            push(
                "updatedAfter",
                updated_after.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }
        if let Some(location) = self.location {
            push("location", location.to_string());
        }
        if let Some(category) = self.category {
            push("category", category.to_string());
        }
        if let Some(tag) = &self.tag {
            push("tag", tag.clone());
        }
        if let Some(cursor) = &self.page_cursor {
            push("pageCursor", cursor.clone());
        }
        if self.with_html_content {
            push("withHtmlContent", "true".to_string());
        }
        query
    }
}

/// One page of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub count: u64,
    /// `None` on the last page.
    #[serde(rename = "nextPageCursor", default)]
    pub next_page_cursor: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Document>,
}

impl ListDocumentsResponse {
    /// Options for the page after this one, or `None` when this is the last
    /// page. All other filters are carried over from `current`.
    pub fn next_page(&self, current: &ListDocumentsOptions) -> Option<ListDocumentsOptions> {
        let cursor = self.next_page_cursor.as_deref().filter(|c| !c.is_empty())?;
        Some(ListDocumentsOptions {
            page_cursor: Some(cursor.to_string()),
            ..current.clone()
        })
    }
}
