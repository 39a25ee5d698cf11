use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const DEFAULT_COLOR: &str = "#3B82F6";
pub const MAX_LIMIT: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<i64>,
    pub category: Option<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<i64>,
}

/// Absent fields are left alone; an explicit `null` clears a nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub search: Option<String>,
    pub completed: Option<bool>,
    pub category_id: Option<i64>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoList {
    pub data: Vec<Todo>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

fn first_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default)]
pub struct Store {
    todos: BTreeMap<i64, Todo>,
    categories: BTreeMap<i64, Category>,
    next_todo_id: i64,
    next_category_id: i64,
}

impl Store {
    fn todo_id(&mut self) -> i64 {
        self.next_todo_id += 1;
        self.next_todo_id
    }

    fn category_id(&mut self) -> i64 {
        self.next_category_id += 1;
        self.next_category_id
    }

    /// Attach the embedded category the way the API serializes it.
    fn hydrate(&self, todo: &Todo) -> Todo {
        let mut todo = todo.clone();
        todo.category = todo.category_id.and_then(|id| self.categories.get(&id).cloned());
        todo
    }

    fn require_category(&self, id: Option<i64>) -> Result<(), ApiFailure> {
        match id {
            Some(id) if !self.categories.contains_key(&id) => Err(unprocessable("Category not found")),
            _ => Ok(()),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;
type ApiFailure = (StatusCode, Json<Detail>);
type ApiResult<T> = Result<T, ApiFailure>;

fn failure(status: StatusCode, detail: &str) -> ApiFailure {
    (
        status,
        Json(Detail {
            detail: detail.to_string(),
        }),
    )
}

fn not_found(what: &str) -> ApiFailure {
    failure(StatusCode::NOT_FOUND, &format!("{what} not found"))
}

fn unprocessable(detail: &str) -> ApiFailure {
    failure(StatusCode::UNPROCESSABLE_ENTITY, detail)
}

fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(unprocessable(&format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/api/todos/{id}/complete", patch(toggle_todo))
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock todo API ready");
    }
    axum::serve(listener, app()).await
}

async fn list_todos(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<TodoList>> {
    if params.page < 1 {
        return Err(unprocessable("page must be at least 1"));
    }
    if !(1..=MAX_LIMIT).contains(&params.limit) {
        return Err(unprocessable("limit must be between 1 and 50"));
    }

    let store = db.read().await;
    let needle = params.search.as_deref().unwrap_or("").to_lowercase();
    let matching: Vec<&Todo> = store
        .todos
        .values()
        .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
        .filter(|t| params.completed.map_or(true, |c| t.completed == c))
        .filter(|t| params.category_id.map_or(true, |c| t.category_id == Some(c)))
        .filter(|t| params.priority.map_or(true, |p| t.priority == p))
        .collect();

    let total = matching.len() as u64;
    let total_pages = if total == 0 {
        1
    } else {
        total.div_ceil(u64::from(params.limit)) as u32
    };
    let skip = (u64::from(params.page - 1) * u64::from(params.limit)) as usize;
    let data = matching
        .into_iter()
        .skip(skip)
        .take(params.limit as usize)
        .map(|t| store.hydrate(t))
        .collect();

    Ok(Json(TodoList {
        data,
        pagination: Pagination {
            current_page: params.page,
            per_page: params.limit,
            total,
            total_pages,
        },
    }))
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    require_text("title", &input.title)?;
    let mut store = db.write().await;
    store.require_category(input.category_id)?;
    let now = Utc::now();
    let todo = Todo {
        id: store.todo_id(),
        title: input.title,
        description: input.description,
        completed: input.completed,
        priority: input.priority,
        due_date: input.due_date,
        category_id: input.category_id,
        category: None,
        created_at: now,
        updated_at: now,
    };
    store.todos.insert(todo.id, todo.clone());
    Ok((StatusCode::CREATED, Json(store.hydrate(&todo))))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Todo>> {
    let store = db.read().await;
    let todo = store.todos.get(&id).ok_or_else(|| not_found("Todo"))?;
    Ok(Json(store.hydrate(todo)))
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> ApiResult<Json<Todo>> {
    if let Some(title) = &input.title {
        require_text("title", title)?;
    }
    let mut store = db.write().await;
    if let Some(category_id) = input.category_id {
        store.require_category(category_id)?;
    }
    let todo = store.todos.get_mut(&id).ok_or_else(|| not_found("Todo"))?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(description) = input.description {
        todo.description = description;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    if let Some(priority) = input.priority {
        todo.priority = priority;
    }
    if let Some(due_date) = input.due_date {
        todo.due_date = due_date;
    }
    if let Some(category_id) = input.category_id {
        todo.category_id = category_id;
    }
    todo.updated_at = Utc::now();
    let todo = todo.clone();
    Ok(Json(store.hydrate(&todo)))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store
        .todos
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("Todo"))
}

async fn toggle_todo(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Todo>> {
    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or_else(|| not_found("Todo"))?;
    todo.completed = !todo.completed;
    todo.updated_at = Utc::now();
    let todo = todo.clone();
    Ok(Json(store.hydrate(&todo)))
}

async fn list_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    let store = db.read().await;
    Json(store.categories.values().cloned().collect())
}

async fn create_category(
    State(db): State<Db>,
    Json(input): Json<CreateCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    require_text("name", &input.name)?;
    let mut store = db.write().await;
    if store.categories.values().any(|c| c.name == input.name) {
        return Err(failure(StatusCode::CONFLICT, "Category name already exists"));
    }
    let category = Category {
        id: store.category_id(),
        name: input.name,
        color: input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        created_at: Utc::now(),
    };
    store.categories.insert(category.id, category.clone());
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCategory>,
) -> ApiResult<Json<Category>> {
    if let Some(name) = &input.name {
        require_text("name", name)?;
    }
    let mut store = db.write().await;
    if let Some(name) = &input.name {
        if store.categories.values().any(|c| c.id != id && &c.name == name) {
            return Err(failure(StatusCode::CONFLICT, "Category name already exists"));
        }
    }
    let category = store.categories.get_mut(&id).ok_or_else(|| not_found("Category"))?;
    if let Some(name) = input.name {
        category.name = name;
    }
    if let Some(color) = input.color {
        category.color = color;
    }
    Ok(Json(category.clone()))
}

/// Todos that pointed at the removed category lose their reference.
async fn delete_category(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store.categories.remove(&id).ok_or_else(|| not_found("Category"))?;
    for todo in store.todos.values_mut() {
        if todo.category_id == Some(id) {
            todo.category_id = None;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_priority_as_literal() {
        let now = Utc::now();
        let todo = Todo {
            id: 1,
            title: "Test".to_string(),
            description: None,
            completed: false,
            priority: Priority::High,
            due_date: None,
            category_id: None,
            category: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["priority"], "high");
        assert!(json["category"].is_null());
    }

    #[test]
    fn create_todo_defaults() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"No extras"}"#).unwrap();
        assert!(!input.completed);
        assert_eq!(input.priority, Priority::Medium);
        assert!(input.category_id.is_none());
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_todo_rejects_unknown_priority() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"title":"x","priority":"urgent"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_all_fields_optional() {
        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.category_id.is_none());
    }

    #[test]
    fn update_todo_explicit_null_clears() {
        let input: UpdateTodo = serde_json::from_str(r#"{"category_id":null}"#).unwrap();
        assert_eq!(input.category_id, Some(None));
        assert!(input.description.is_none());
    }
}
