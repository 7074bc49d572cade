//! In-memory stand-in for the Readwise Reader API.
//!
//! Serves the four document endpoints under `/api/v3` with the same paths,
//! status codes and body shapes as the real service, including token auth
//! and cursor pagination. Integration tests run it on a random port.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v3";
pub const DEFAULT_TOKEN: &str = "test-token";
pub const DEFAULT_PAGE_SIZE: usize = 100;

const LOCATIONS: [&str; 4] = ["new", "later", "archive", "feed"];
const CATEGORIES: [&str; 8] = [
    "article", "email", "rss", "pdf", "epub", "tweet", "video", "highlight",
];

/// A stored document, serialized the way the list endpoint returns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub url: String,
    pub source_url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub category: String,
    pub location: String,
    pub tags: Map<String, Value>,
    pub image_url: Option<String>,
    pub published_date: Option<String>,
    pub word_count: Option<u64>,
    pub reading_progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub first_opened_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip)]
    pub html: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveDocument {
    pub url: String,
    pub html: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub published_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub should_clean_html: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDocument {
    pub html: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub published_date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub id: Option<String>,
    pub updated_after: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub page_cursor: Option<String>,
    pub with_html_content: Option<String>,
}

/// `{id, url}` body returned by save and update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentPage {
    pub count: usize,
    #[serde(rename = "nextPageCursor")]
    pub next_page_cursor: Option<String>,
    pub results: Vec<Document>,
}

/// Settings for one mock instance.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub token: String,
    pub page_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub type Db = Arc<RwLock<Vec<Document>>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    authorization: Arc<str>,
    page_size: usize,
}

type Failure = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Vec::new())),
        authorization: format!("Token {}", config.token).into(),
        page_size: config.page_size.max(1),
    };
    let api = Router::new()
        .route("/save/", post(save_document))
        .route("/list/", get(list_documents))
        .route("/update/{id}/", patch(update_document))
        .route("/delete/{id}/", delete(delete_document));
    Router::new().nest(API_PREFIX, api).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn failure(status: StatusCode, body: Value) -> Failure {
    (status, Json(body))
}

fn not_found() -> Failure {
    failure(StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Failure> {
    let presented = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if presented == Some(&*state.authorization) {
        return Ok(());
    }
    Err(failure(
        StatusCode::UNAUTHORIZED,
        json!({ "detail": "Invalid token." }),
    ))
}

fn check_choice(field: &str, value: Option<&str>, choices: &[&str]) -> Result<(), Failure> {
    match value {
        Some(value) if !choices.contains(&value) => Err(failure(
            StatusCode::BAD_REQUEST,
            json!({ field: [format!("\"{value}\" is not a valid choice.")] }),
        )),
        _ => Ok(()),
    }
}

fn tag_map(tags: &[String]) -> Map<String, Value> {
    tags.iter()
        .map(|tag| (tag.clone(), json!({ "name": tag, "type": "manual" })))
        .collect()
}

fn reader_url(id: &str) -> String {
    format!("https://read.readwise.io/new/read/{id}")
}

async fn save_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SaveDocument>,
) -> Result<(StatusCode, Json<DocumentRef>), Failure> {
    authorize(&state, &headers)?;
    if input.url.is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            json!({ "url": ["This field may not be blank."] }),
        ));
    }
    check_choice("location", input.location.as_deref(), &LOCATIONS)?;
    check_choice("category", input.category.as_deref(), &CATEGORIES)?;

    let mut db = state.db.write().await;
    if let Some(existing) = db.iter().find(|doc| doc.source_url == input.url) {
        let existing = DocumentRef {
            id: existing.id.clone(),
            url: existing.url.clone(),
        };
        return Ok((StatusCode::OK, Json(existing)));
    }

    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now();
    let word_count = input
        .html
        .as_deref()
        .map(|html| html.split_whitespace().count() as u64);
    let doc = Document {
        id: id.clone(),
        url: reader_url(&id),
        source_url: input.url,
        title: input.title,
        author: input.author,
        summary: input.summary,
        notes: input.notes,
        category: input.category.unwrap_or_else(|| "article".to_string()),
        location: input.location.unwrap_or_else(|| "new".to_string()),
        tags: tag_map(&input.tags),
        image_url: input.image_url,
        published_date: input.published_date,
        word_count,
        reading_progress: 0.0,
        created_at: now,
        updated_at: now,
        first_opened_at: None,
        html_content: None,
        html: input.html,
    };
    let created = DocumentRef {
        id,
        url: doc.url.clone(),
    };
    db.push(doc);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<DocumentPage>, Failure> {
    authorize(&state, &headers)?;
    check_choice("location", params.location.as_deref(), &LOCATIONS)?;
    check_choice("category", params.category.as_deref(), &CATEGORIES)?;

    let updated_after = params
        .updated_after
        .as_deref()
        .map(DateTime::parse_from_rfc3339)
        .transpose()
        .map_err(|_| {
            failure(
                StatusCode::BAD_REQUEST,
                json!({ "updatedAfter": ["Enter a valid date/time."] }),
            )
        })?;
    let offset = match params.page_cursor.as_deref() {
        Some(cursor) => cursor.parse::<usize>().map_err(|_| {
            failure(StatusCode::BAD_REQUEST, json!({ "detail": "Invalid cursor." }))
        })?,
        None => 0,
    };
    let with_html = params.with_html_content.as_deref() == Some("true");

    let db = state.db.read().await;
    let matching: Vec<&Document> = db
        .iter()
        .filter(|doc| params.id.as_ref().map_or(true, |id| &doc.id == id))
        .filter(|doc| params.location.as_ref().map_or(true, |l| &doc.location == l))
        .filter(|doc| params.category.as_ref().map_or(true, |c| &doc.category == c))
        .filter(|doc| params.tag.as_ref().map_or(true, |t| doc.tags.contains_key(t)))
        .filter(|doc| updated_after.map_or(true, |after| doc.updated_at > after))
        .collect();

    let end = (offset + state.page_size).min(matching.len());
    let results = matching
        .iter()
        .skip(offset)
        .take(state.page_size)
        .map(|doc| {
            let mut doc = (*doc).clone();
            if with_html {
                doc.html_content = doc.html.clone();
            }
            doc
        })
        .collect();
    let next_page_cursor = (end < matching.len()).then(|| end.to_string());

    Ok(Json(DocumentPage {
        count: matching.len(),
        next_page_cursor,
        results,
    }))
}

async fn update_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateDocument>,
) -> Result<Json<DocumentRef>, Failure> {
    authorize(&state, &headers)?;
    check_choice("location", input.location.as_deref(), &LOCATIONS)?;
    check_choice("category", input.category.as_deref(), &CATEGORIES)?;

    let mut db = state.db.write().await;
    let doc = db.iter_mut().find(|doc| doc.id == id).ok_or_else(not_found)?;
    if let Some(html) = input.html {
        doc.html = Some(html);
    }
    if let Some(title) = input.title {
        doc.title = Some(title);
    }
    if let Some(author) = input.author {
        doc.author = Some(author);
    }
    if let Some(summary) = input.summary {
        doc.summary = Some(summary);
    }
    if let Some(published_date) = input.published_date {
        doc.published_date = Some(published_date);
    }
    if let Some(tags) = input.tags {
        doc.tags = tag_map(&tags);
    }
    if let Some(location) = input.location {
        doc.location = location;
    }
    if let Some(category) = input.category {
        doc.category = category;
    }
    if let Some(image_url) = input.image_url {
        doc.image_url = Some(image_url);
    }
    if let Some(notes) = input.notes {
        doc.notes = Some(notes);
    }
    doc.updated_at = Utc::now();

    Ok(Json(DocumentRef {
        id: doc.id.clone(),
        url: doc.url.clone(),
    }))
}

async fn delete_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    let index = db.iter().position(|doc| doc.id == id).ok_or_else(not_found)?;
    db.remove(index);
    Ok(StatusCode::NO_CONTENT)
}
