//! The tools this server offers and their handlers.
//!
//! A handler never fails the JSON-RPC call: bad arguments and client errors
//! come back as a `ToolResult` with `isError` set, so the assistant sees
//! the message and the server keeps running.

use std::fmt;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use reader_core::duration::parse_duration;
use reader_core::{
    CallContext, Category, Client, CreateDocumentRequest, ListDocumentsOptions, Location,
    Transport, UpdateDocumentRequest,
};

/// `list` looks this far back when `since` is omitted.
const DEFAULT_SINCE: &str = "12h";
const DEFAULT_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Save,
    List,
    Update,
    Move,
    Delete,
}

impl Tool {
    pub const ALL: [Tool; 5] = [Tool::Save, Tool::List, Tool::Update, Tool::Move, Tool::Delete];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Save => "save",
            Tool::List => "list",
            Tool::Update => "update",
            Tool::Move => "move",
            Tool::Delete => "delete",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Entry for `tools/list`.
    pub fn definition(&self) -> Value {
        let (description, read_only, schema) = match self {
            Tool::Save => (
                "Save a given URL link to Readwise Reader",
                false,
                json!({
                    "type": "object",
                    "properties": {
                        "url": { "type": "string", "description": "The URL of the document to save" },
                        "summary": { "type": "string", "description": "A brief summary of the link" },
                        "location": {
                            "type": "string",
                            "enum": ["new", "later", "archive", "feed"],
                            "description": "Where to file the document (default: new)"
                        }
                    },
                    "required": ["url"]
                }),
            ),
            Tool::List => (
                "List documents from Readwise Reader",
                true,
                json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "enum": ["new", "later", "archive", "feed"],
                            "description": "Location of documents: new, later, archive, or feed"
                        },
                        "since": {
                            "type": "string",
                            "description": "Only documents updated within this long ago, e.g. 10s, 30m, 24h (default: 12h)"
                        },
                        "limit": {
                            "type": "number",
                            "description": "Maximum number of documents to return (default: 5)"
                        }
                    },
                    "required": ["location"]
                }),
            ),
            Tool::Update => (
                "Update fields of a document in Readwise Reader",
                false,
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "The ID of the document to update" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "summary": { "type": "string" },
                        "notes": { "type": "string", "description": "Top-level note on the document" },
                        "image_url": { "type": "string" },
                        "published_date": { "type": "string", "description": "RFC 3339 timestamp" },
                        "location": { "type": "string", "enum": ["new", "later", "archive", "feed"] },
                        "category": {
                            "type": "string",
                            "enum": ["article", "email", "rss", "pdf", "epub", "tweet", "video", "highlight"]
                        },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["id"]
                }),
            ),
            Tool::Move => (
                "Move a document to a different location in Readwise Reader",
                false,
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "The ID of the document to move" },
                        "location": {
                            "type": "string",
                            "enum": ["new", "inbox", "later", "archive", "feed"],
                            "description": "The target location: new, inbox, later, archive, or feed"
                        }
                    },
                    "required": ["id", "location"]
                }),
            ),
            Tool::Delete => (
                "Permanently delete a document from Readwise Reader",
                false,
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "The ID of the document to delete" }
                    },
                    "required": ["id"]
                }),
            ),
        };

        json!({
            "name": self.name(),
            "description": description,
            "inputSchema": schema,
            "annotations": {
                "title": description,
                "readOnlyHint": read_only,
            },
        })
    }

    pub fn call<T: Transport>(
        &self,
        client: &Client<T>,
        ctx: &CallContext,
        arguments: &Map<String, Value>,
    ) -> ToolResult {
        let args = Arguments(arguments);
        let outcome = match self {
            Tool::Save => save(client, ctx, &args),
            Tool::List => list(client, ctx, &args),
            Tool::Update => update(client, ctx, &args),
            Tool::Move => move_document(client, ctx, &args),
            Tool::Delete => delete(client, ctx, &args),
        };
        match outcome {
            Ok(text) => ToolResult::text(text),
            Err(err) => {
                debug!(tool = self.name(), error = %format!("{err:#}"), "tool failed");
                ToolResult::error(format!("{err:#}"))
            }
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Body of a `tools/call` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }
}

/// Typed access to the `arguments` object of a tool call.
struct Arguments<'a>(&'a Map<String, Value>);

impl Arguments<'_> {
    fn optional_str(&self, key: &str) -> Result<Option<&str>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => bail!("argument {key:?} must be a string"),
        }
    }

    fn required_str(&self, key: &str) -> Result<&str> {
        self.optional_str(key)?
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow!("required argument {key:?} not found"))
    }

    fn optional_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.optional_str(key)?.map(str::to_string))
    }

    /// A whole number. Clients send JSON numbers, so `2.9` is accepted and
    /// truncated toward zero to `2`.
    fn optional_integer(&self, key: &str) -> Result<Option<i64>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))),
            Some(_) => bail!("argument {key:?} must be a number"),
        }
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| anyhow!("argument {key:?} must be a list of strings"))
                })
                .collect(),
            Some(_) => bail!("argument {key:?} must be a list of strings"),
        }
    }

    fn location(&self, key: &str) -> Result<Option<Location>> {
        self.optional_str(key)?
            .map(|value| {
                value.parse::<Location>().map_err(|_| {
                    anyhow!("invalid location: must be one of new, later, archive, or feed")
                })
            })
            .transpose()
    }

    fn category(&self, key: &str) -> Result<Option<Category>> {
        self.optional_str(key)?
            .map(|value| value.parse::<Category>().map_err(anyhow::Error::from))
            .transpose()
    }

    fn timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        self.optional_str(key)?
            .map(|value| {
                DateTime::parse_from_rfc3339(value)
                    .map(|date| date.with_timezone(&Utc))
                    .with_context(|| format!("argument {key:?} must be an RFC 3339 timestamp"))
            })
            .transpose()
    }
}

fn save<T: Transport>(client: &Client<T>, ctx: &CallContext, args: &Arguments) -> Result<String> {
    let url = args.required_str("url")?;
    let request = CreateDocumentRequest {
        summary: args.optional_string("summary")?,
        location: Some(args.location("location")?.unwrap_or(Location::New)),
        ..Default::default()
    };
    let created = client
        .create_document(ctx, url, &request)
        .context("failed to save document")?;
    Ok(serde_json::to_string(&created)?)
}

fn list<T: Transport>(client: &Client<T>, ctx: &CallContext, args: &Arguments) -> Result<String> {
    let location = args
        .location("location")?
        .ok_or_else(|| anyhow!("required argument \"location\" not found"))?;

    let since = args.optional_str("since")?.unwrap_or(DEFAULT_SINCE);
    let since = parse_duration(since).context("invalid since duration")?;
    let since = chrono::Duration::from_std(since).context("invalid since duration")?;

    let limit = args.optional_integer("limit")?.unwrap_or(DEFAULT_LIMIT);
    let limit = usize::try_from(limit)
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or_else(|| anyhow!("limit must be greater than 0"))?;

    let options = ListDocumentsOptions {
        location: Some(location),
        updated_after: Some(
            Utc::now()
                .checked_sub_signed(since)
                .context("since is out of range")?,
        ),
        ..Default::default()
    };
    let mut page = client
        .list_documents(ctx, &options)
        .context("failed to list documents")?;
    page.results.truncate(limit);

    Ok(serde_json::to_string_pretty(&page)?)
}

fn update<T: Transport>(client: &Client<T>, ctx: &CallContext, args: &Arguments) -> Result<String> {
    let id = args.required_str("id")?;
    let request = UpdateDocumentRequest {
        title: args.optional_string("title")?,
        author: args.optional_string("author")?,
        summary: args.optional_string("summary")?,
        notes: args.optional_string("notes")?,
        image_url: args.optional_string("image_url")?,
        published_date: args.timestamp("published_date")?,
        location: args.location("location")?,
        category: args.category("category")?,
        tags: args.string_list("tags")?,
        ..Default::default()
    };
    if request.is_empty() {
        bail!("at least one field to update is required");
    }
    let updated = client
        .update_document(ctx, id, &request)
        .context("failed to update document")?;
    Ok(serde_json::to_string_pretty(&updated)?)
}

/// `inbox` is what the Reader UI calls the `new` location.
fn move_location(value: &str) -> Option<Location> {
    match value {
        "inbox" => Some(Location::New),
        other => other.parse().ok(),
    }
}

fn move_document<T: Transport>(
    client: &Client<T>,
    ctx: &CallContext,
    args: &Arguments,
) -> Result<String> {
    let id = args.required_str("id")?;
    let location = move_location(args.required_str("location")?).ok_or_else(|| {
        anyhow!("invalid location: must be one of new, inbox, later, archive, or feed")
    })?;
    let moved = client
        .update_document(ctx, id, &UpdateDocumentRequest::move_to(location))
        .context("failed to move document")?;
    Ok(serde_json::to_string_pretty(&moved)?)
}

fn delete<T: Transport>(client: &Client<T>, ctx: &CallContext, args: &Arguments) -> Result<String> {
    let id = args.required_str("id")?;
    client
        .delete_document(ctx, id)
        .context("failed to delete document")?;
    Ok(format!("Document {id} deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body, recording_client};
    use reader_core::{HttpMethod, HttpResponse};

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn call(
        tool: Tool,
        responses: Vec<HttpResponse>,
        arguments: Value,
    ) -> (ToolResult, Vec<reader_core::HttpRequest>) {
        let (client, recorder) = recording_client(responses);
        let result = tool.call(&client, &CallContext::background(), &args(arguments));
        (result, recorder.sent())
    }

    #[test]
    fn every_tool_has_a_schema() {
        for tool in Tool::ALL {
            let definition = tool.definition();
            assert_eq!(definition["name"], tool.name());
            assert_eq!(definition["inputSchema"]["type"], "object");
            assert!(definition["inputSchema"]["required"].is_array());
            assert_eq!(Tool::parse(tool.name()), Some(tool));
        }
        assert_eq!(Tool::parse("archive"), None);
    }

    #[test]
    fn only_list_is_read_only() {
        let read_only: Vec<_> = Tool::ALL
            .into_iter()
            .filter(|tool| tool.definition()["annotations"]["readOnlyHint"] == true)
            .collect();
        assert_eq!(read_only, [Tool::List]);
    }

    #[test]
    fn save_defaults_location_to_new() {
        let (result, sent) = call(
            Tool::Save,
            vec![HttpResponse::new(201, r#"{"id":"doc1","url":"https://r/doc1"}"#)],
            json!({"url": "https://example.com/a", "summary": "short"}),
        );
        assert!(!result.is_error, "{result:?}");
        assert_eq!(
            body(&sent[0]),
            json!({"url": "https://example.com/a", "summary": "short", "location": "new"})
        );
        let created: Value = serde_json::from_str(&result.content[0].text).unwrap();
        assert_eq!(created["id"], "doc1");
    }

    #[test]
    fn save_without_url_is_a_tool_error() {
        let (result, sent) = call(Tool::Save, Vec::new(), json!({}));
        assert!(result.is_error);
        assert!(result.content[0].text.contains("\"url\""));
        assert!(sent.is_empty());
    }

    #[test]
    fn list_applies_defaults_and_truncates() {
        let results: Vec<Value> = (0..8)
            .map(|n| json!({"id": format!("d{n}"), "url": "u"}))
            .collect();
        let page = json!({"count": 8, "nextPageCursor": null, "results": results});
        let before = Utc::now();
        let (result, sent) = call(
            Tool::List,
            vec![HttpResponse::new(200, page.to_string())],
            json!({"location": "later"}),
        );
        assert!(!result.is_error, "{result:?}");

        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].query_param("location"), Some("later"));
        let updated_after: DateTime<Utc> = sent[0]
            .query_param("updatedAfter")
            .unwrap()
            .parse()
            .unwrap();
        let twelve_hours_ago = before - chrono::Duration::hours(12);
        assert!((updated_after - twelve_hours_ago).num_seconds().abs() <= 2);

        let page: Value = serde_json::from_str(&result.content[0].text).unwrap();
        assert_eq!(page["results"].as_array().unwrap().len(), 5);
        assert_eq!(page["count"], 8);
    }

    #[test]
    fn list_honors_limit() {
        let page = json!({"count": 3, "nextPageCursor": null, "results": [
            {"id": "a", "url": "u"}, {"id": "b", "url": "u"}, {"id": "c", "url": "u"}
        ]});
        let (result, _) = call(
            Tool::List,
            vec![HttpResponse::new(200, page.to_string())],
            json!({"location": "new", "since": "30m", "limit": 2}),
        );
        let page: Value = serde_json::from_str(&result.content[0].text).unwrap();
        assert_eq!(page["results"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn list_truncates_fractional_limit() {
        let page = json!({"count": 3, "nextPageCursor": null, "results": [
            {"id": "a", "url": "u"}, {"id": "b", "url": "u"}, {"id": "c", "url": "u"}
        ]});
        let (result, _) = call(
            Tool::List,
            vec![HttpResponse::new(200, page.to_string())],
            json!({"location": "new", "limit": 2.9}),
        );
        let page: Value = serde_json::from_str(&result.content[0].text).unwrap();
        assert_eq!(page["results"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn list_with_since_beyond_calendar_range_is_a_tool_error() {
        let (result, sent) = call(
            Tool::List,
            Vec::new(),
            json!({"location": "new", "since": "3000000000h"}),
        );
        assert!(result.is_error);
        assert!(result.content[0].text.contains("since is out of range"), "{result:?}");
        assert!(sent.is_empty());
    }

    #[test]
    fn list_rejects_bad_arguments_without_calling() {
        for arguments in [
            json!({}),
            json!({"location": "inbox"}),
            json!({"location": "new", "limit": 0}),
            json!({"location": "new", "limit": -3}),
            json!({"location": "new", "since": "forever"}),
            json!({"location": "new", "limit": "five"}),
        ] {
            let (result, sent) = call(Tool::List, Vec::new(), arguments.clone());
            assert!(result.is_error, "{arguments}");
            assert!(sent.is_empty(), "{arguments}");
        }
    }

    #[test]
    fn update_sends_given_fields() {
        let (result, sent) = call(
            Tool::Update,
            vec![HttpResponse::new(200, r#"{"id":"doc1","url":"https://r/doc1"}"#)],
            json!({"id": "doc1", "title": "New title", "tags": ["a", "b"], "category": "pdf"}),
        );
        assert!(!result.is_error, "{result:?}");
        assert_eq!(sent[0].method, HttpMethod::Patch);
        assert_eq!(
            body(&sent[0]),
            json!({"title": "New title", "tags": ["a", "b"], "category": "pdf"})
        );
    }

    #[test]
    fn update_without_fields_is_a_tool_error() {
        let (result, sent) = call(Tool::Update, Vec::new(), json!({"id": "doc1"}));
        assert!(result.is_error);
        assert!(result.content[0].text.contains("at least one field"));
        assert!(sent.is_empty());
    }

    #[test]
    fn move_accepts_inbox_alias() {
        let (result, sent) = call(
            Tool::Move,
            vec![HttpResponse::new(200, r#"{"id":"doc1","url":"https://r/doc1"}"#)],
            json!({"id": "doc1", "location": "inbox"}),
        );
        assert!(!result.is_error, "{result:?}");
        assert!(sent[0].path.ends_with("/update/doc1/"));
        assert_eq!(body(&sent[0]), json!({"location": "new"}));
    }

    #[test]
    fn move_rejects_unknown_location() {
        let (result, sent) = call(
            Tool::Move,
            Vec::new(),
            json!({"id": "doc1", "location": "trash"}),
        );
        assert!(result.is_error);
        assert!(result.content[0].text.contains("inbox"));
        assert!(sent.is_empty());
    }

    #[test]
    fn delete_reports_api_errors_as_tool_errors() {
        let (result, _) = call(
            Tool::Delete,
            vec![HttpResponse::new(404, r#"{"detail":"Not found."}"#)],
            json!({"id": "doc1"}),
        );
        assert!(result.is_error);
        assert_eq!(
            result.content[0].text,
            "failed to delete document: API error (status 404): Not found."
        );
    }

    #[test]
    fn delete_confirms() {
        let (result, sent) = call(
            Tool::Delete,
            vec![HttpResponse::new(204, "")],
            json!({"id": "doc1"}),
        );
        assert_eq!(result, ToolResult::text("Document doc1 deleted successfully"));
        assert_eq!(sent[0].method, HttpMethod::Delete);
    }

    #[test]
    fn result_serializes_with_is_error_key() {
        let value = serde_json::to_value(ToolResult::error("boom")).unwrap();
        assert_eq!(
            value,
            json!({"content": [{"type": "text", "text": "boom"}], "isError": true})
        );
    }
}
