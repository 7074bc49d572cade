//! Request builder and response parser for the Reader API.
//!
//! # Design
//! `RequestMapper` holds only the API root and the authorization header and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. Input validation happens in `build_*`,
//! so a rejected call never reaches a transport.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreateDocumentRequest, CreateDocumentResponse, ListDocumentsOptions, ListDocumentsResponse,
    UpdateDocumentRequest, UpdateDocumentResponse,
};

/// Stateless translation between typed calls and wire requests/responses.
#[derive(Clone)]
pub struct RequestMapper {
    base_url: String,
    authorization: String,
}

/// Body of `POST /save/`: the URL merged with the optional fields.
#[derive(Serialize)]
struct SaveBody<'a> {
    url: &'a str,
    #[serde(flatten)]
    request: &'a CreateDocumentRequest,
}

impl RequestMapper {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            authorization: format!("Token {}", config.token()),
        }
    }

    pub fn build_create_document(
        &self,
        url: &str,
        input: &CreateDocumentRequest,
    ) -> Result<HttpRequest> {
        if url.is_empty() {
            return Err(Error::invalid_request("URL is required"));
        }
        self.json_request(
            HttpMethod::Post,
            "/save/".to_string(),
            &SaveBody { url, request: input },
        )
    }

    pub fn build_list_documents(&self, options: &ListDocumentsOptions) -> HttpRequest {
        let mut request = self.request(HttpMethod::Get, "/list/".to_string());
        request.query = options.query();
        request
    }

    pub fn build_update_document(
        &self,
        document_id: &str,
        input: &UpdateDocumentRequest,
    ) -> Result<HttpRequest> {
        validate_document_id(document_id)?;
        self.json_request(
            HttpMethod::Patch,
            format!("/update/{document_id}/"),
            input,
        )
    }

    pub fn build_delete_document(&self, document_id: &str) -> Result<HttpRequest> {
        validate_document_id(document_id)?;
        Ok(self.request(HttpMethod::Delete, format!("/delete/{document_id}/")))
    }

    /// The service answers 201 for a new document and 200 when the URL was
    /// already saved; both carry the document reference.
    pub fn parse_create_document(&self, response: HttpResponse) -> Result<CreateDocumentResponse> {
        check_status(&response, &[200, 201])?;
        decode(&response.body)
    }

    pub fn parse_list_documents(&self, response: HttpResponse) -> Result<ListDocumentsResponse> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    pub fn parse_update_document(&self, response: HttpResponse) -> Result<UpdateDocumentResponse> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    pub fn parse_delete_document(&self, response: HttpResponse) -> Result<()> {
        check_status(&response, &[204])
    }

    fn request(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers: vec![
                ("authorization".to_string(), self.authorization.clone()),
                ("accept".to_string(), "application/json".to_string()),
            ],
            body: None,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: String,
        body: &B,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_string(body)
            .map_err(|e| Error::invalid_request(format!("failed to marshal request: {e}")))?;
        let mut request = self.request(method, path);
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(body);
        Ok(request)
    }
}

impl std::fmt::Debug for RequestMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMapper")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Document IDs become a path segment, so they must be non-empty and must
/// not contain URL delimiters.
fn validate_document_id(document_id: &str) -> Result<()> {
    if document_id.is_empty() {
        return Err(Error::invalid_parameter("document ID cannot be empty"));
    }
    if document_id.contains(['/', '?', '#']) {
        return Err(Error::invalid_parameter(format!(
            "document ID contains invalid characters: {document_id:?}"
        )));
    }
    Ok(())
}

/// Map any status outside `accepted` to an `ApiError`.
fn check_status(response: &HttpResponse, accepted: &[u16]) -> Result<()> {
    if accepted.contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::from_response(response.status, &response.body).into())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(Error::Decode)
}
