use std::net::TcpListener;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use task_tracker_rs::api::UserStore;
use task_tracker_rs::task::{Task, TaskPatch, TaskRepository, UserId};
use task_tracker_rs::{serve, AppState, StoreError};

async fn spawn(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(serve(listener, state));
    format!("http://{}", addr)
}

async fn register(client: &Client, base: &str, email: &str) -> String {
    let resp = client
        .post(format!("{base}/api/auth/signup"))
        .json(&json!({"name": "Tester", "email": email, "password": "secret1"}))
        .send()
        .await
        .expect("signup request");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": email, "password": "secret1"}))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("login body");
    body["token"].as_str().expect("token").to_string()
}

async fn create(client: &Client, base: &str, token: &str, body: Value) -> Value {
    let resp = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("task body")
}

#[tokio::test]
async fn created_task_is_invisible_to_other_users() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let alice = register(&client, &base, "alice@example.com").await;
    let bob = register(&client, &base, "bob@example.com").await;

    let task = create(&client, &base, &alice, json!({"title": "Write report"})).await;
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["status"], "pending");
    let id = task["id"].as_str().expect("server-generated id");

    let resp = client
        .get(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "Task not found"}));

    let resp = client
        .get(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn task_routes_require_a_valid_bearer_token() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();

    let resp = client.get(format!("{base}/api/tasks")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "No token, authorization denied");

    let resp = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth("forged")
        .json(&json!({"title": "sneaky"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Token is not valid");
}

#[tokio::test]
async fn single_task_routes_require_a_token() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;
    let task = create(&client, &base, &token, json!({"title": "private"})).await;
    let url = format!("{base}/api/tasks/{}", task["id"].as_str().unwrap());

    let requests = [
        client.get(&url),
        client.put(&url).json(&json!({"title": "hijacked"})),
        client.delete(&url),
    ];
    for request in requests {
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "No token, authorization denied");
    }

    let fetched: Value = client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["title"], "private");
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;

    let resp = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth(&token)
        .json(&json!({"title": "x", "status": "archived"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error(), "got {}", resp.status());

    let task = create(&client, &base, &token, json!({"title": "x"})).await;
    let resp = client
        .put(format!("{base}/api/tasks/{}", task["id"].as_str().unwrap()))
        .bearer_auth(&token)
        .json(&json!({"status": "archived"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error(), "got {}", resp.status());
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;

    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "Logged out"}));

    let resp = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Token is not valid");

    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn client_supplied_owner_is_ignored() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let alice = register(&client, &base, "alice@example.com").await;
    let bob = register(&client, &base, "bob@example.com").await;

    let task = create(
        &client,
        &base,
        &alice,
        json!({"title": "mine", "owner": "someone-else"}),
    )
    .await;
    assert_ne!(task["owner"], "someone-else");

    let listed: Vec<Value> = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["owner"], task["owner"]);

    let bobs: Vec<Value> = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(bobs.is_empty());
}

#[tokio::test]
async fn update_patches_only_the_fields_sent() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;
    let task = create(
        &client,
        &base,
        &token,
        json!({"title": "X", "description": "details", "status": "in-progress"}),
    )
    .await;
    let url = format!("{base}/api/tasks/{}", task["id"].as_str().unwrap());

    let updated: Value = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({"title": "Y"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["title"], "Y");
    assert_eq!(updated["description"], "details");
    assert_eq!(updated["status"], "in-progress");

    let cleared: Value = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({"description": null, "status": "done"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cleared.get("description").is_none());
    assert_eq!(cleared["status"], "done");

    let fetched: Value = client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["title"], "Y");
}

#[tokio::test]
async fn delete_confirms_then_task_is_gone() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;
    let task = create(&client, &base, &token, json!({"title": "temporary"})).await;
    let url = format!("{base}/api/tasks/{}", task["id"].as_str().unwrap());

    let resp = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "Task deleted"}));

    let resp = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;

    let resp = client
        .put(format!("{base}/api/tasks/task_does_not_exist"))
        .bearer_auth(&token)
        .json(&json!({"title": "Y"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .delete(format!("{base}/api/tasks/task_does_not_exist"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_and_duplicate_signup() {
    let base = spawn(AppState::in_memory()).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;

    let profile: Value = client
        .get(format!("{base}/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile, json!({"name": "Tester", "email": "alice@example.com"}));

    let resp = client
        .post(format!("{base}/api/auth/signup"))
        .json(&json!({"name": "Again", "email": "alice@example.com", "password": "secret1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User already exists");
}

struct UnavailableStore;

impl TaskRepository for UnavailableStore {
    fn insert(&self, _task: Task) -> Result<Task, StoreError> {
        Err(StoreError::Poisoned)
    }
    fn find(&self, _owner: &UserId) -> Result<Vec<Task>, StoreError> {
        Err(StoreError::Poisoned)
    }
    fn find_one(&self, _id: &str, _owner: &UserId) -> Result<Option<Task>, StoreError> {
        Err(StoreError::Poisoned)
    }
    fn find_one_and_update(
        &self,
        _id: &str,
        _owner: &UserId,
        _patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        Err(StoreError::Poisoned)
    }
    fn find_one_and_delete(&self, _id: &str, _owner: &UserId) -> Result<Option<Task>, StoreError> {
        Err(StoreError::Poisoned)
    }
}

#[tokio::test]
async fn store_failures_are_generic_500s() {
    let state = AppState::new(Arc::new(UnavailableStore), Arc::new(UserStore::in_memory()));
    let base = spawn(state).await;
    let client = Client::new();
    let token = register(&client, &base, "alice@example.com").await;

    let resp = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "Server error"}));

    let resp = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth(&token)
        .json(&json!({"title": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_ok() {
    let base = spawn(AppState::in_memory()).await;
    let body: Value = Client::new()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}
