//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Any 2xx status counts as success; the body of a delete is ignored.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::filter::FilterCriteria;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Category, CategoryDraft, CategoryUpdate, Todo, TodoDraft, TodoPage, TodoUpdate};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- todos ---

    pub fn build_list_todos(&self, criteria: &FilterCriteria) -> HttpRequest {
        self.bare(
            HttpMethod::Get,
            format!("/api/todos?{}", criteria.to_query_string()),
        )
    }

    pub fn build_get_todo(&self, id: i64) -> HttpRequest {
        self.bare(HttpMethod::Get, format!("/api/todos/{id}"))
    }

    pub fn build_create_todo(&self, input: &TodoDraft) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Post, "/api/todos".to_string(), input)
    }

    pub fn build_update_todo(&self, id: i64, input: &TodoUpdate) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Put, format!("/api/todos/{id}"), input)
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        self.bare(HttpMethod::Delete, format!("/api/todos/{id}"))
    }

    pub fn build_toggle_completion(&self, id: i64) -> HttpRequest {
        self.bare(HttpMethod::Patch, format!("/api/todos/{id}/complete"))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<TodoPage, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_toggle_completion(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    // --- categories ---

    pub fn build_list_categories(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, "/api/categories".to_string())
    }

    pub fn build_create_category(&self, input: &CategoryDraft) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Post, "/api/categories".to_string(), input)
    }

    pub fn build_update_category(
        &self,
        id: i64,
        input: &CategoryUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Put, format!("/api/categories/{id}"), input)
    }

    pub fn build_delete_category(&self, id: i64) -> HttpRequest {
        self.bare(HttpMethod::Delete, format!("/api/categories/{id}"))
    }

    pub fn parse_list_categories(&self, response: HttpResponse) -> Result<Vec<Category>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_category(&self, response: HttpResponse) -> Result<Category, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_category(&self, response: HttpResponse) -> Result<Category, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_category(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn bare(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json<T: Serialize>(
        &self,
        method: HttpMethod,
        path: String,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::ServerError {
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}
