use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Category, Detail, Priority, Todo, TodoList};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn bare_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

/// Drive one request through a shared router so state persists across calls.
async fn call(
    app: &mut axum::routing::RouterIntoService<String>,
    request: Request<String>,
) -> axum::response::Response {
    ServiceExt::ready(app).await.unwrap().call(request).await.unwrap()
}

fn shared() -> axum::routing::RouterIntoService<String> {
    let router: Router = app();
    router.into_service()
}

// --- list ---

#[tokio::test]
async fn list_todos_empty() {
    let resp = app().oneshot(bare_request("GET", "/api/todos")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let list: TodoList = body_json(resp).await;
    assert!(list.data.is_empty());
    assert_eq!(list.pagination.current_page, 1);
    assert_eq!(list.pagination.per_page, 10);
    assert_eq!(list.pagination.total, 0);
    assert_eq!(list.pagination.total_pages, 1);
}

#[tokio::test]
async fn list_todos_rejects_out_of_range_limit() {
    let resp = app()
        .oneshot(bare_request("GET", "/api/todos?page=1&limit=51"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app()
        .oneshot(bare_request("GET", "/api/todos?page=0"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_todos_filters_and_paginates() {
    let mut app = shared();
    for (title, priority) in [
        ("Buy milk", "high"),
        ("Buy bread", "low"),
        ("Call mom", "high"),
        ("Buy eggs", "high"),
    ] {
        let body = format!(r#"{{"title":"{title}","priority":"{priority}"}}"#);
        let resp = call(&mut app, json_request("POST", "/api/todos", &body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = call(&mut app, bare_request("GET", "/api/todos?priority=high&page=1&limit=2")).await;
    let list: TodoList = body_json(resp).await;
    let titles: Vec<&str> = list.data.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Buy milk", "Call mom"]);
    assert_eq!(list.pagination.total, 3);
    assert_eq!(list.pagination.total_pages, 2);

    let resp = call(&mut app, bare_request("GET", "/api/todos?priority=high&page=2&limit=2")).await;
    let list: TodoList = body_json(resp).await;
    assert_eq!(list.data.len(), 1);
    assert_eq!(list.data[0].title, "Buy eggs");

    let resp = call(&mut app, bare_request("GET", "/api/todos?search=BUY%20b")).await;
    let list: TodoList = body_json(resp).await;
    assert_eq!(list.data.len(), 1);
    assert_eq!(list.data[0].title, "Buy bread");

    let resp = call(&mut app, bare_request("GET", "/api/todos?completed=true")).await;
    let list: TodoList = body_json(resp).await;
    assert!(list.data.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_todo_returns_201_with_server_fields() {
    let resp = app()
        .oneshot(json_request("POST", "/api/todos", r#"{"title":"Buy milk"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let todo: Todo = body_json(resp).await;
    assert_eq!(todo.id, 1);
    assert_eq!(todo.title, "Buy milk");
    assert_eq!(todo.priority, Priority::Medium);
    assert!(!todo.completed);
    assert_eq!(todo.created_at, todo.updated_at);
}

#[tokio::test]
async fn create_todo_blank_title_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/todos", r#"{"title":"   "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let detail: Detail = body_json(resp).await;
    assert_eq!(detail.detail, "title must not be empty");
}

#[tokio::test]
async fn create_todo_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/todos", r#"{"not_title":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_todo_unknown_category_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/todos", r#"{"title":"x","category_id":99}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get / update / toggle / delete on missing ids ---

#[tokio::test]
async fn get_todo_not_found() {
    let resp = app().oneshot(bare_request("GET", "/api/todos/1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let detail: Detail = body_json(resp).await;
    assert_eq!(detail.detail, "Todo not found");
}

#[tokio::test]
async fn get_todo_bad_id_returns_400() {
    let resp = app()
        .oneshot(bare_request("GET", "/api/todos/not-a-number"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_todo_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/todos/7", r#"{"title":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggle_todo_not_found() {
    let resp = app()
        .oneshot(bare_request("PATCH", "/api/todos/7/complete"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = app().oneshot(bare_request("DELETE", "/api/todos/7")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full todo lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let mut app = shared();

    // create
    let resp = call(&mut app, json_request("POST", "/api/todos", r#"{"title":"Walk dog","description":"twice"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Todo = body_json(resp).await;
    let id = created.id;

    // get
    let resp = call(&mut app, bare_request("GET", &format!("/api/todos/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Todo = body_json(resp).await;
    assert_eq!(fetched.title, "Walk dog");

    // update: partial title, explicit null description
    let resp = call(
        &mut app,
        json_request("PUT", &format!("/api/todos/{id}"), r#"{"title":"Walk cat","description":null}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.title, "Walk cat");
    assert!(updated.description.is_none());
    assert!(!updated.completed);
    assert!(updated.updated_at >= created.updated_at);

    // toggle twice
    let resp = call(&mut app, bare_request("PATCH", &format!("/api/todos/{id}/complete"))).await;
    let toggled: Todo = body_json(resp).await;
    assert!(toggled.completed);
    let resp = call(&mut app, bare_request("PATCH", &format!("/api/todos/{id}/complete"))).await;
    let toggled: Todo = body_json(resp).await;
    assert!(!toggled.completed);

    // delete
    let resp = call(&mut app, bare_request("DELETE", &format!("/api/todos/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // second delete: 404
    let resp = call(&mut app, bare_request("DELETE", &format!("/api/todos/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete: empty
    let resp = call(&mut app, bare_request("GET", "/api/todos")).await;
    let list: TodoList = body_json(resp).await;
    assert!(list.data.is_empty());
}

// --- categories ---

#[tokio::test]
async fn category_lifecycle() {
    let mut app = shared();

    let resp = call(&mut app, json_request("POST", "/api/categories", r#"{"name":"Work"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let work: Category = body_json(resp).await;
    assert_eq!(work.color, "#3B82F6");

    let resp = call(&mut app, json_request("POST", "/api/categories", r#"{"name":"Work"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = call(
        &mut app,
        json_request("PUT", &format!("/api/categories/{}", work.id), r##"{"color":"#10B981"}"##),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let recolored: Category = body_json(resp).await;
    assert_eq!(recolored.name, "Work");
    assert_eq!(recolored.color, "#10B981");

    // a todo in the category embeds it
    let body = format!(r#"{{"title":"Report","category_id":{}}}"#, work.id);
    let resp = call(&mut app, json_request("POST", "/api/todos", &body)).await;
    let todo: Todo = body_json(resp).await;
    assert_eq!(todo.category.as_ref().map(|c| c.id), Some(work.id));

    let resp = call(&mut app, bare_request("GET", "/api/categories")).await;
    let categories: Vec<Category> = body_json(resp).await;
    assert_eq!(categories.len(), 1);

    // deleting the category detaches the todo
    let resp = call(&mut app, bare_request("DELETE", &format!("/api/categories/{}", work.id))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = call(&mut app, bare_request("GET", &format!("/api/todos/{}", todo.id))).await;
    let detached: Todo = body_json(resp).await;
    assert!(detached.category_id.is_none());
    assert!(detached.category.is_none());

    let resp = call(&mut app, bare_request("DELETE", &format!("/api/categories/{}", work.id))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
