//! Application state and its transition function.
//!
//! # Design
//! `reduce` is a pure function of `(previous state, action)`: it performs no
//! I/O and reads nothing but its arguments. The store replaces its state
//! wholesale with the result, so no partially applied transition is ever
//! observable.
//!
//! `loading` is derived from a count of operations in flight. With a single
//! operation it behaves exactly like a boolean set on start and cleared on
//! completion; with several, the first one to finish does not hide the others.

use crate::filter::{FilterCriteria, FilterUpdate};
use crate::types::{Category, PaginationInfo, Todo, TodoPage};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// The last page returned by the server, in server order.
    pub todos: Vec<Todo>,
    /// Unique by id.
    pub categories: Vec<Category>,
    pub filters: FilterCriteria,
    pub pagination: Option<PaginationInfo>,
    pub loading: bool,
    pub error: Option<String>,
    in_flight: usize,
}

impl AppState {
    pub fn with_filters(filters: FilterCriteria) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn todo(&self, id: i64) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
    }
}

/// Outcome events folded into `AppState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Started,
    TodosFetched(TodoPage),
    CategoriesFetched(Vec<Category>),
    TodoCreated(Todo),
    TodoUpdated(Todo),
    TodoToggled(Todo),
    TodoDeleted(i64),
    CategoryCreated(Category),
    CategoryUpdated(Category),
    CategoryDeleted(i64),
    Failed(String),
    /// The server no longer has this todo: drop it locally and record why.
    TodoMissing { id: i64, message: String },
    /// A response arrived after a newer one for the same entity was applied.
    Superseded,
    FiltersChanged(FilterUpdate),
    ErrorCleared,
}

pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::Started => {
            next.in_flight += 1;
            next.loading = true;
        }
        Action::TodosFetched(page) => {
            next.todos = page.data;
            next.pagination = Some(page.pagination);
            next.settle();
        }
        Action::CategoriesFetched(categories) => {
            next.categories = Vec::with_capacity(categories.len());
            for category in categories {
                if next.category(category.id).is_none() {
                    next.categories.push(category);
                }
            }
            next.settle();
        }
        Action::TodoCreated(todo) => {
            next.todos.retain(|existing| existing.id != todo.id);
            next.todos.insert(0, todo);
            next.settle();
        }
        Action::TodoUpdated(todo) | Action::TodoToggled(todo) => {
            if let Some(slot) = next.todos.iter_mut().find(|existing| existing.id == todo.id) {
                *slot = todo;
            }
            next.settle();
        }
        Action::TodoDeleted(id) => {
            next.todos.retain(|todo| todo.id != id);
            next.settle();
        }
        Action::CategoryCreated(category) | Action::CategoryUpdated(category) => {
            match next.categories.iter_mut().find(|existing| existing.id == category.id) {
                Some(slot) => *slot = category,
                None => next.categories.push(category),
            }
            next.settle();
        }
        Action::CategoryDeleted(id) => {
            next.categories.retain(|category| category.id != id);
            next.settle();
        }
        Action::Failed(message) => {
            next.error = Some(message);
            next.settle();
        }
        Action::TodoMissing { id, message } => {
            next.todos.retain(|todo| todo.id != id);
            next.error = Some(message);
            next.settle();
        }
        Action::Superseded => next.settle(),
        Action::FiltersChanged(update) => {
            next.filters = state.filters.merge(&update);
        }
        Action::ErrorCleared => next.error = None,
    }
    next
}
