//! The client facade: one method per Reader API operation.
//!
//! # Design
//! `Client` owns an immutable `RequestMapper` and a `Transport`; it holds no
//! mutable state, so a single client can be shared across threads. Each
//! operation is build → one round trip → parse, with no retries. Pagination
//! is left to the caller (see `ListDocumentsResponse::next_page`).

use tracing::debug;

use crate::config::Config;
use crate::context::CallContext;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::mapper::RequestMapper;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    CreateDocumentRequest, CreateDocumentResponse, ListDocumentsOptions, ListDocumentsResponse,
    UpdateDocumentRequest, UpdateDocumentResponse,
};

/// Client for the Readwise Reader API.
#[derive(Debug, Clone)]
pub struct Client<T = UreqTransport> {
    mapper: RequestMapper,
    transport: T,
}

impl Client<UreqTransport> {
    /// Client using the blocking ureq transport with the configured timeout.
    pub fn new(config: &Config) -> Self {
        Self::with_transport(config, UreqTransport::new(config.timeout()))
    }

    /// Client configured from `READWISE_ACCESS_TOKEN` and friends.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(&Config::from_env()?))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: &Config, transport: T) -> Self {
        Self {
            mapper: RequestMapper::new(config),
            transport,
        }
    }

    /// Save `url` as a new document. Saving a URL that already exists
    /// returns the existing document.
    pub fn create_document(
        &self,
        ctx: &CallContext,
        url: &str,
        input: &CreateDocumentRequest,
    ) -> Result<CreateDocumentResponse> {
        let request = self.mapper.build_create_document(url, input)?;
        let response = self.round_trip(ctx, request)?;
        self.mapper.parse_create_document(response)
    }

    /// Fetch one page of documents matching `options`.
    pub fn list_documents(
        &self,
        ctx: &CallContext,
        options: &ListDocumentsOptions,
    ) -> Result<ListDocumentsResponse> {
        let request = self.mapper.build_list_documents(options);
        let response = self.round_trip(ctx, request)?;
        self.mapper.parse_list_documents(response)
    }

    /// Apply the fields set in `input` to an existing document.
    pub fn update_document(
        &self,
        ctx: &CallContext,
        document_id: &str,
        input: &UpdateDocumentRequest,
    ) -> Result<UpdateDocumentResponse> {
        let request = self.mapper.build_update_document(document_id, input)?;
        let response = self.round_trip(ctx, request)?;
        self.mapper.parse_update_document(response)
    }

    /// Permanently delete a document.
    pub fn delete_document(&self, ctx: &CallContext, document_id: &str) -> Result<()> {
        let request = self.mapper.build_delete_document(document_id)?;
        let response = self.round_trip(ctx, request)?;
        self.mapper.parse_delete_document(response)
    }

    fn round_trip(&self, ctx: &CallContext, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, "sending request");

        let response = self.transport.execute(ctx, request).inspect_err(|e| {
            debug!(%method, %path, error = %e, "request failed");
        })?;

        debug!(%method, %path, status = response.status, "received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use crate::error::Error;
    use crate::http::HttpMethod;
    use crate::types::Location;
    use std::sync::Mutex;

    /// Records every request and replies with canned responses in order.
    struct Scripted {
        requests: Mutex<Vec<HttpRequest>>,
        responses: Mutex<Vec<HttpResponse>>,
    }

    impl Scripted {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into_iter().rev().collect()),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for Scripted {
        fn execute(&self, ctx: &CallContext, request: HttpRequest) -> Result<HttpResponse> {
            ctx.check()?;
            self.requests.lock().unwrap().push(request);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("no scripted response left"))
        }
    }

    fn client(responses: Vec<HttpResponse>) -> Client<Scripted> {
        let config = Config::new("test-token")
            .unwrap()
            .with_base_url("http://reader.test/api/v3");
        Client::with_transport(&config, Scripted::new(responses))
    }

    fn ctx() -> CallContext {
        CallContext::background()
    }

    #[test]
    fn missing_identifiers_never_reach_transport() {
        let client = client(Vec::new());

        let err = client
            .create_document(&ctx(), "", &CreateDocumentRequest::default())
            .unwrap_err();
        assert!(err.is_local());

        let err = client
            .update_document(&ctx(), "", &UpdateDocumentRequest::move_to(Location::Later))
            .unwrap_err();
        assert!(err.is_local());

        let err = client.delete_document(&ctx(), "").unwrap_err();
        assert!(err.is_local());

        assert!(client.transport.requests().is_empty());
    }

    #[test]
    fn create_returns_typed_result() {
        let client = client(vec![HttpResponse::new(
            201,
            r#"{"id":"doc123","url":"https://example.com/a"}"#,
        )]);
        let created = client
            .create_document(&ctx(), "https://example.com/a", &CreateDocumentRequest::default())
            .unwrap();
        assert_eq!(created.id, "doc123");
        assert_eq!(created.url, "https://example.com/a");

        let sent = client.transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"url":"https://example.com/a"}"#));
    }

    #[test]
    fn update_sends_only_location() {
        let client = client(vec![HttpResponse::new(
            200,
            r#"{"id":"doc1","url":"https://x/doc1"}"#,
        )]);
        let updated = client
            .update_document(&ctx(), "doc1", &UpdateDocumentRequest::move_to(Location::Archive))
            .unwrap();
        assert_eq!(updated.id, "doc1");
        assert_eq!(updated.url, "https://x/doc1");

        let sent = client.transport.requests();
        assert_eq!(sent[0].path, "http://reader.test/api/v3/update/doc1/");
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"location":"archive"}"#));
    }

    #[test]
    fn server_error_is_remote_for_every_operation() {
        let error = || HttpResponse::new(500, r#"{"error": "internal server error"}"#);
        let client = client(vec![error(), error(), error(), error()]);

        let results = [
            client
                .create_document(&ctx(), "https://example.com", &CreateDocumentRequest::default())
                .map(|_| ()),
            client
                .list_documents(&ctx(), &ListDocumentsOptions::default())
                .map(|_| ()),
            client
                .update_document(&ctx(), "doc1", &UpdateDocumentRequest::move_to(Location::New))
                .map(|_| ()),
            client.delete_document(&ctx(), "doc1"),
        ];
        for result in results {
            let err = result.unwrap_err();
            assert!(err.is_remote(), "{err:?}");
            assert_eq!(err.status(), Some(500));
        }
    }

    #[test]
    fn delete_accepts_no_content() {
        let client = client(vec![HttpResponse::new(204, "")]);
        client.delete_document(&ctx(), "doc1").unwrap();
        assert_eq!(client.transport.requests()[0].method, HttpMethod::Delete);
    }

    #[test]
    fn caller_driven_pagination_follows_cursor_until_null() {
        let client = client(vec![
            HttpResponse::new(
                200,
                r#"{"count":3,"nextPageCursor":"page2","results":[{"id":"a"},{"id":"b"}]}"#,
            ),
            HttpResponse::new(
                200,
                r#"{"count":3,"nextPageCursor":null,"results":[{"id":"c"}]}"#,
            ),
        ]);

        let mut options = ListDocumentsOptions {
            location: Some(Location::Later),
            ..Default::default()
        };
        let mut ids = Vec::new();
        loop {
            let page = client.list_documents(&ctx(), &options).unwrap();
            ids.extend(page.results.iter().map(|doc| doc.id.clone()));
            match page.next_page(&options) {
                Some(next) => options = next,
                None => break,
            }
        }

        assert_eq!(ids, ["a", "b", "c"]);
        let sent = client.transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].query_param("pageCursor"), None);
        assert_eq!(sent[1].query_param("pageCursor"), Some("page2"));
        assert_eq!(sent[1].query_param("location"), Some("later"));
    }

    #[test]
    fn cancelled_context_is_reported() {
        let client = client(Vec::new());
        let token = CancelToken::new();
        token.cancel();
        let err = client
            .list_documents(
                &CallContext::background().with_cancel(token),
                &ListDocumentsOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(client.transport.requests().is_empty());
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
    }
}
