//! Synchronous client for the Readwise Reader API.
//!
//! # Overview
//! `Client` exposes the four document operations (create, list, update,
//! delete). Each call is one blocking round trip: `RequestMapper` builds an
//! `HttpRequest`, a `Transport` executes it, and the mapper parses the
//! `HttpResponse` into a typed result or an `Error`.
//! `decode_document_webhook_payload` handles inbound webhooks independently
//! of the client.
//!
//! # Design
//! - `RequestMapper` is pure: no I/O, so request shapes and status handling
//!   are tested without a network.
//! - Input validation happens before the transport is touched.
//! - Every call takes a `CallContext` carrying an optional deadline and
//!   cancel token.
//! - Pagination is caller-driven via `ListDocumentsResponse::next_page`.
//!
//! ```no_run
//! use reader_core::{CallContext, Client, Config, ListDocumentsOptions, Location};
//!
//! let client = Client::new(&Config::from_env()?);
//! let ctx = CallContext::background();
//! let mut options = ListDocumentsOptions {
//!     location: Some(Location::Later),
//!     ..Default::default()
//! };
//! loop {
//!     let page = client.list_documents(&ctx, &options)?;
//!     for doc in &page.results {
//!         println!("{} {}", doc.id, doc.title.as_deref().unwrap_or(""));
//!     }
//!     match page.next_page(&options) {
//!         Some(next) => options = next,
//!         None => break,
//!     }
//! }
//! # Ok::<(), reader_core::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod context;
mod de;
pub mod duration;
pub mod error;
pub mod http;
pub mod mapper;
pub mod transport;
pub mod types;
pub mod webhook;

pub use client::Client;
pub use config::Config;
pub use context::{CallContext, CancelToken};
pub use error::{ApiError, ClientErrorKind, Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mapper::RequestMapper;
pub use transport::{Transport, UreqTransport};
pub use types::{
    Category, CreateDocumentRequest, CreateDocumentResponse, Document, DocumentRef,
    ListDocumentsOptions, ListDocumentsResponse, Location, UpdateDocumentRequest,
    UpdateDocumentResponse,
};
pub use webhook::{decode_document_webhook_payload, DocumentWebhookPayload, WebhookEvent};
