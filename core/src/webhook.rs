//! Decoding of inbound document webhooks.
//!
//! The service posts a flat JSON object describing a document and the event
//! that fired. Almost every field can be missing or `null`; both decode to
//! the empty/absent state rather than an error. `event_type` is kept as the
//! raw string so payloads for events added after this crate was built still
//! decode.

use std::fmt;
use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::de::{lenient_count, null_as_default};
use crate::error::{Error, Result};
use crate::types::{Category, Location};

/// Webhook events known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEvent {
    /// Any new document was added.
    AnyDocumentCreated,
    /// A document arrived from an RSS feed or newsletter.
    FeedDocumentCreated,
    /// A document was added manually.
    NonFeedDocumentCreated,
    DocumentTagsUpdated,
    /// Marked as read.
    DocumentFinished,
    DocumentArchived,
    DocumentMovedToLater,
    DocumentMovedToInbox,
    /// Added to favorites.
    DocumentShortlisted,
}

impl WebhookEvent {
    pub const ALL: [WebhookEvent; 9] = [
        WebhookEvent::AnyDocumentCreated,
        WebhookEvent::FeedDocumentCreated,
        WebhookEvent::NonFeedDocumentCreated,
        WebhookEvent::DocumentTagsUpdated,
        WebhookEvent::DocumentFinished,
        WebhookEvent::DocumentArchived,
        WebhookEvent::DocumentMovedToLater,
        WebhookEvent::DocumentMovedToInbox,
        WebhookEvent::DocumentShortlisted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::AnyDocumentCreated => "reader.any_document.created",
            WebhookEvent::FeedDocumentCreated => "reader.feed_document.created",
            WebhookEvent::NonFeedDocumentCreated => "reader.non_feed_document.created",
            WebhookEvent::DocumentTagsUpdated => "reader.document.tags_updated",
            WebhookEvent::DocumentFinished => "reader.document.finished",
            WebhookEvent::DocumentArchived => "reader.document.archived",
            WebhookEvent::DocumentMovedToLater => "reader.document.moved_to_later",
            WebhookEvent::DocumentMovedToInbox => "reader.document.moved_to_inbox",
            WebhookEvent::DocumentShortlisted => "reader.document.shortlisted",
        }
    }

    /// `None` for event types this crate does not know about.
    pub fn parse(raw: &str) -> Option<Self> {
        WebhookEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == raw)
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a document webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentWebhookPayload {
    /// Raw event type; see `event()`.
    #[serde(deserialize_with = "null_as_default")]
    pub event_type: String,
    /// Shared verification secret configured for the webhook.
    #[serde(deserialize_with = "null_as_default")]
    pub secret: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    /// How the document was added.
    pub source: Option<String>,
    /// Raw category; see `category()`.
    pub category: Option<String>,
    /// Raw location; see `location()`.
    pub location: Option<String>,
    pub tags: Option<Map<String, Value>>,
    #[serde(deserialize_with = "null_as_default")]
    pub site_name: String,
    #[serde(deserialize_with = "lenient_count")]
    pub word_count: Option<u64>,
    pub reading_time: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Publication date as sent by the service; its format varies by source.
    pub published_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    pub image_url: Option<String>,
    /// Full document content.
    pub content: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub source_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
    /// Set when the document belongs to a thread.
    pub parent_id: Option<String>,
    /// Percentage read, 0 to 100.
    pub reading_progress: Option<f64>,
    pub first_opened_at: Option<DateTime<Utc>>,
    pub last_opened_at: Option<DateTime<Utc>>,
    pub saved_at: Option<DateTime<Utc>>,
    pub last_moved_at: Option<DateTime<Utc>>,
}

impl DocumentWebhookPayload {
    /// The event that fired, if it is one this crate knows.
    pub fn event(&self) -> Option<WebhookEvent> {
        WebhookEvent::parse(&self.event_type)
    }

    /// The category, if it is one this crate knows.
    pub fn category(&self) -> Option<Category> {
        self.category.as_deref()?.parse().ok()
    }

    /// The location, if it is one this crate knows.
    pub fn location(&self) -> Option<Location> {
        self.location.as_deref()?.parse().ok()
    }

    /// Compare the payload's secret with `expected` without short-circuiting
    /// on the first differing byte.
    pub fn verify_secret(&self, expected: &str) -> bool {
        let actual = self.secret.as_bytes();
        let expected = expected.as_bytes();
        if actual.len() != expected.len() || expected.is_empty() {
            return false;
        }
        actual
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

/// Decode a webhook body, e.g. the body of an inbound POST.
pub fn decode_document_webhook_payload<R: Read>(reader: R) -> Result<DocumentWebhookPayload> {
    serde_json::from_reader(reader).map_err(Error::Decode)
}
