//! Client-side state synchronization for the todo/category REST API.
//!
//! # Overview
//! Two layers:
//! - the service facade (`TodoService`), which maps domain operations onto
//!   HTTP requests and typed records, and
//! - the state container (`TodoStore`), which owns `AppState` and folds each
//!   operation's outcome into it through the pure `state::reduce`.
//!
//! # Design
//! - `TodoClient` is stateless and does no I/O: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`.
//! - `Transport` is the I/O seam. `UreqTransport` runs requests on tokio's
//!   blocking pool; tests substitute scripted transports.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod service;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use config::Config;
pub use error::{ApiError, ConfigError};
pub use filter::{FilterCriteria, FilterUpdate};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::TodoService;
pub use state::{reduce, Action, AppState};
pub use store::TodoStore;
pub use transport::{Transport, UreqTransport};
pub use types::{
    Category, CategoryDraft, CategoryUpdate, PaginationInfo, Priority, Todo, TodoDraft, TodoPage,
    TodoUpdate,
};
