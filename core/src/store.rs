//! The state container.
//!
//! # Design
//! `TodoStore` is an explicit session object: create one per session, hand
//! `&TodoStore` (or an `Arc`) to whatever needs it, drop it when the session
//! ends. Its `AppState` lives in a `tokio::sync::watch` channel; every
//! transition goes through `state::reduce` inside `send_modify`, so readers
//! and subscribers only ever see whole states.
//!
//! Operations are independent. Two in-flight calls may resolve in either
//! order and the later one wins, unless `discard_stale_responses` is enabled:
//! then each call takes a sequence number and a success response older than
//! the last one applied for that record is dropped. A confirmed delete is
//! always applied and retires the record's sequencing state.
//!
//! Mutating operations record a failure in `AppState::error` and return it
//! as well. Refreshes only record it.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::filter::{FilterCriteria, FilterUpdate};
use crate::service::TodoService;
use crate::state::{reduce, Action, AppState};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Category, CategoryDraft, CategoryUpdate, Todo, TodoDraft, TodoUpdate, DEFAULT_CATEGORIES,
};

/// The unit that response sequencing is tracked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Entity {
    TodoList,
    CategoryList,
    Todo(i64),
    Category(i64),
}

/// Sequence numbers are drawn from one counter, so they stay ordered across
/// a record's retirement and reuse.
#[derive(Debug, Default)]
struct Sequencer {
    next: u64,
    issued: HashMap<Entity, u64>,
    applied: HashMap<Entity, u64>,
}

impl Sequencer {
    fn issue(&mut self, entity: Entity) -> u64 {
        self.next += 1;
        self.issued.insert(entity, self.next);
        self.next
    }

    /// True if `seq` is newer than anything applied for `entity`. Responses
    /// for a retired entity are never fresh.
    fn accept(&mut self, entity: Entity, seq: u64) -> bool {
        if !self.issued.contains_key(&entity) {
            return false;
        }
        let applied = self.applied.entry(entity).or_default();
        if seq > *applied {
            *applied = seq;
            true
        } else {
            false
        }
    }

    fn retire(&mut self, entity: Entity) {
        self.issued.remove(&entity);
        self.applied.remove(&entity);
    }
}

pub struct TodoStore<T> {
    service: TodoService<T>,
    state: watch::Sender<AppState>,
    sequencer: Option<Mutex<Sequencer>>,
}

impl TodoStore<UreqTransport> {
    /// A store talking HTTP to `config.base_url`.
    pub fn connect(config: &Config) -> Self {
        let service = TodoService::new(TodoClient::new(&config.base_url), UreqTransport::new());
        let initial = AppState::with_filters(FilterCriteria::with_page_size(config.page_size));
        TodoStore::with_state(service, initial).discard_stale_responses(config.discard_stale_responses)
    }
}

impl<T: Transport> TodoStore<T> {
    pub fn new(service: TodoService<T>) -> Self {
        Self::with_state(service, AppState::default())
    }

    pub fn with_state(service: TodoService<T>, initial: AppState) -> Self {
        Self {
            service,
            state: watch::Sender::new(initial),
            sequencer: None,
        }
    }

    pub fn discard_stale_responses(mut self, enabled: bool) -> Self {
        self.sequencer = enabled.then(|| Mutex::new(Sequencer::default()));
        self
    }

    pub fn service(&self) -> &TodoService<T> {
        &self.service
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub async fn refresh_todos(&self) {
        let ticket = self.begin(Entity::TodoList);
        let criteria = self.state.borrow().filters.clone();
        match self.service.list_todos(&criteria).await {
            Ok(page) => self.commit(Entity::TodoList, ticket, Action::TodosFetched(page)),
            Err(err) => self.fail("fetch todos", &err),
        }
    }

    pub async fn refresh_categories(&self) {
        let ticket = self.begin(Entity::CategoryList);
        match self.service.list_categories().await {
            Ok(categories) => self.commit(
                Entity::CategoryList,
                ticket,
                Action::CategoriesFetched(categories),
            ),
            Err(err) => self.fail("fetch categories", &err),
        }
    }

    pub async fn create_todo(&self, draft: &TodoDraft) -> Result<Todo, ApiError> {
        self.dispatch(Action::Started);
        match self.service.create_todo(draft).await {
            Ok(todo) => {
                self.dispatch(Action::TodoCreated(todo.clone()));
                Ok(todo)
            }
            Err(err) => {
                self.fail("create todo", &err);
                Err(err)
            }
        }
    }

    pub async fn update_todo(&self, id: i64, fields: &TodoUpdate) -> Result<Todo, ApiError> {
        let ticket = self.begin(Entity::Todo(id));
        match self.service.update_todo(id, fields).await {
            Ok(todo) => {
                self.commit(Entity::Todo(id), ticket, Action::TodoUpdated(todo.clone()));
                Ok(todo)
            }
            Err(err) => {
                self.fail("update todo", &err);
                Err(err)
            }
        }
    }

    /// A 404 means the record is already gone: it is dropped from the local
    /// list, and the error is still recorded and returned.
    pub async fn delete_todo(&self, id: i64) -> Result<(), ApiError> {
        self.begin(Entity::Todo(id));
        match self.service.delete_todo(id).await {
            Ok(()) => {
                self.remove(Entity::Todo(id), Action::TodoDeleted(id));
                Ok(())
            }
            Err(ApiError::NotFound) => {
                let message = failure_message("delete todo", &ApiError::NotFound);
                warn!(id, "{message}");
                self.remove(Entity::Todo(id), Action::TodoMissing { id, message });
                Err(ApiError::NotFound)
            }
            Err(err) => {
                self.fail("delete todo", &err);
                Err(err)
            }
        }
    }

    /// The new flag comes from the server; nothing is flipped locally.
    pub async fn toggle_completion(&self, id: i64) -> Result<Todo, ApiError> {
        let ticket = self.begin(Entity::Todo(id));
        match self.service.toggle_completion(id).await {
            Ok(todo) => {
                self.commit(Entity::Todo(id), ticket, Action::TodoToggled(todo.clone()));
                Ok(todo)
            }
            Err(err) => {
                self.fail("toggle todo completion", &err);
                Err(err)
            }
        }
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
        self.dispatch(Action::Started);
        match self.service.create_category(draft).await {
            Ok(category) => {
                self.dispatch(Action::CategoryCreated(category.clone()));
                Ok(category)
            }
            Err(err) => {
                self.fail("create category", &err);
                Err(err)
            }
        }
    }

    pub async fn update_category(
        &self,
        id: i64,
        fields: &CategoryUpdate,
    ) -> Result<Category, ApiError> {
        let ticket = self.begin(Entity::Category(id));
        match self.service.update_category(id, fields).await {
            Ok(category) => {
                self.commit(
                    Entity::Category(id),
                    ticket,
                    Action::CategoryUpdated(category.clone()),
                );
                Ok(category)
            }
            Err(err) => {
                self.fail("update category", &err);
                Err(err)
            }
        }
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.begin(Entity::Category(id));
        match self.service.delete_category(id).await {
            Ok(()) => {
                self.remove(Entity::Category(id), Action::CategoryDeleted(id));
                Ok(())
            }
            Err(err) => {
                self.fail("delete category", &err);
                Err(err)
            }
        }
    }

    /// Create each of `DEFAULT_CATEGORIES` whose name is not already held,
    /// compared case-insensitively. Stops at the first failure.
    pub async fn seed_default_categories(&self) -> Result<Vec<Category>, ApiError> {
        let mut created = Vec::new();
        for (name, color) in DEFAULT_CATEGORIES {
            let held = self
                .state
                .borrow()
                .categories
                .iter()
                .any(|category| category.name.eq_ignore_ascii_case(name));
            if held {
                continue;
            }
            let draft = CategoryDraft::new(name).with_color(color);
            created.push(self.create_category(&draft).await?);
        }
        Ok(created)
    }

    pub fn set_filters(&self, update: FilterUpdate) {
        self.dispatch(Action::FiltersChanged(update));
    }

    /// `set_filters` followed by `refresh_todos`.
    pub async fn apply_filters(&self, update: FilterUpdate) {
        self.set_filters(update);
        self.refresh_todos().await;
    }

    /// Dismiss the current error. Does not retry anything.
    pub fn clear_error(&self) {
        self.dispatch(Action::ErrorCleared);
    }

    fn dispatch(&self, action: Action) {
        self.state.send_modify(|state| *state = reduce(state, action));
    }

    fn begin(&self, entity: Entity) -> Option<u64> {
        self.dispatch(Action::Started);
        self.sequencer
            .as_ref()
            .map(|sequencer| sequencer.lock().issue(entity))
    }

    fn commit(&self, entity: Entity, ticket: Option<u64>, action: Action) {
        let fresh = match (ticket, &self.sequencer) {
            (Some(seq), Some(sequencer)) => sequencer.lock().accept(entity, seq),
            _ => true,
        };
        if fresh {
            self.dispatch(action);
        } else {
            debug!(?entity, "discarding stale response");
            self.dispatch(Action::Superseded);
        }
    }

    /// Applies a removal regardless of ordering. Responses still in flight
    /// for the entity are discarded when they land.
    fn remove(&self, entity: Entity, action: Action) {
        if let Some(sequencer) = &self.sequencer {
            sequencer.lock().retire(entity);
        }
        self.dispatch(action);
    }

    fn fail(&self, operation: &str, err: &ApiError) {
        let message = failure_message(operation, err);
        warn!(error = %err, "{message}");
        self.dispatch(Action::Failed(message));
    }
}

fn failure_message(operation: &str, err: &ApiError) -> String {
    format!("Failed to {operation}: {}", err.summary())
}
