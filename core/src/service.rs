//! The service facade: domain operations over a `Transport`.
//!
//! Each call validates its input, builds the request with `TodoClient`,
//! executes it, and parses the response. The facade owns no mutable state;
//! failures are returned unchanged for the caller to record.

use tracing::debug;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::filter::FilterCriteria;
use crate::transport::Transport;
use crate::types::{Category, CategoryDraft, CategoryUpdate, Todo, TodoDraft, TodoPage, TodoUpdate};

#[derive(Debug, Clone)]
pub struct TodoService<T> {
    client: TodoClient,
    transport: T,
}

impl<T: Transport> TodoService<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub async fn list_todos(&self, criteria: &FilterCriteria) -> Result<TodoPage, ApiError> {
        let req = self.client.build_list_todos(criteria);
        debug!(path = %req.path, "listing todos");
        let response = self.transport.execute(req).await?;
        self.client.parse_list_todos(response)
    }

    pub async fn get_todo(&self, id: i64) -> Result<Todo, ApiError> {
        let response = self.transport.execute(self.client.build_get_todo(id)).await?;
        self.client.parse_get_todo(response)
    }

    pub async fn create_todo(&self, draft: &TodoDraft) -> Result<Todo, ApiError> {
        draft.validate()?;
        let req = self.client.build_create_todo(draft)?;
        debug!(title = %draft.title, "creating todo");
        let response = self.transport.execute(req).await?;
        self.client.parse_create_todo(response)
    }

    pub async fn update_todo(&self, id: i64, fields: &TodoUpdate) -> Result<Todo, ApiError> {
        fields.validate()?;
        let req = self.client.build_update_todo(id, fields)?;
        debug!(id, "updating todo");
        let response = self.transport.execute(req).await?;
        self.client.parse_update_todo(response)
    }

    pub async fn delete_todo(&self, id: i64) -> Result<(), ApiError> {
        debug!(id, "deleting todo");
        let response = self.transport.execute(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)
    }

    /// The server flips the flag; the returned record is authoritative.
    pub async fn toggle_completion(&self, id: i64) -> Result<Todo, ApiError> {
        debug!(id, "toggling todo");
        let response = self
            .transport
            .execute(self.client.build_toggle_completion(id))
            .await?;
        self.client.parse_toggle_completion(response)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let response = self.transport.execute(self.client.build_list_categories()).await?;
        self.client.parse_list_categories(response)
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
        draft.validate()?;
        let req = self.client.build_create_category(draft)?;
        debug!(name = %draft.name, "creating category");
        let response = self.transport.execute(req).await?;
        self.client.parse_create_category(response)
    }

    pub async fn update_category(
        &self,
        id: i64,
        fields: &CategoryUpdate,
    ) -> Result<Category, ApiError> {
        fields.validate()?;
        let req = self.client.build_update_category(id, fields)?;
        debug!(id, "updating category");
        let response = self.transport.execute(req).await?;
        self.client.parse_update_category(response)
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        debug!(id, "deleting category");
        let response = self
            .transport
            .execute(self.client.build_delete_category(id))
            .await?;
        self.client.parse_delete_category(response)
    }
}
