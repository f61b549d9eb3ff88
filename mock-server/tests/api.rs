use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_store, SnippetBody, SnippetList, Store, TagBody, TagList};
use tower::ServiceExt;

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

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn seeded() -> axum::Router {
    app_with_store(
        Store::default()
            .with_tag("t1", "Rust", "rust")
            .with_tag("t2", "Go", "go"),
    )
}

// --- tags ---

#[tokio::test]
async fn list_tags_empty() {
    let resp = app().oneshot(empty_request("GET", "/tags")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let list: TagList = body_json(resp).await;
    assert!(list.tags.is_empty());
}

#[tokio::test]
async fn create_tag_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/tags", r#"{"name":"Rust","slug":"rust"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: TagBody = body_json(resp).await;
    assert_eq!(body.tag.name, "Rust");
    assert!(!body.tag.id.is_empty());
}

#[tokio::test]
async fn create_tag_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/tags", r#"{"name":"Rust"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_tag_duplicate_slug_returns_409() {
    let resp = seeded()
        .oneshot(json_request("POST", "/tags", r#"{"name":"Rust again","slug":"rust"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "slug `rust` is already taken");
}

#[tokio::test]
async fn get_tag_wraps_entity() {
    let resp = seeded().oneshot(empty_request("GET", "/tags/t1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: TagBody = body_json(resp).await;
    assert_eq!(body.tag.slug, "rust");
}

#[tokio::test]
async fn get_tag_not_found() {
    let resp = app().oneshot(empty_request("GET", "/tags/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_tag_is_partial() {
    let resp = seeded()
        .oneshot(json_request("PUT", "/tags/t1", r#"{"id":"t1","name":"Rust Lang"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: TagBody = body_json(resp).await;
    assert_eq!(body.tag.name, "Rust Lang");
    assert_eq!(body.tag.slug, "rust"); // unchanged
}

#[tokio::test]
async fn update_tag_keeping_own_slug_is_allowed() {
    let resp = seeded()
        .oneshot(json_request("PUT", "/tags/t1", r#"{"id":"t1","slug":"rust"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_tag_to_taken_slug_returns_409() {
    let resp = seeded()
        .oneshot(json_request("PUT", "/tags/t1", r#"{"id":"t1","slug":"go"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_tag_with_invalid_slug_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/tags", r#"{"name":"Rust","slug":"Not A Slug"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Not A Slug"));
}

#[tokio::test]
async fn update_tag_with_empty_name_returns_422_and_keeps_tag() {
    let app = seeded();
    let resp = app
        .clone()
        .oneshot(json_request("PUT", "/tags/t1", r#"{"id":"t1","name":""}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app.oneshot(empty_request("GET", "/tags/t1")).await.unwrap();
    let body: TagBody = body_json(resp).await;
    assert_eq!(body.tag.name, "Rust");
}

#[tokio::test]
async fn create_snippet_with_empty_body_returns_422() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/snippets",
            r#"{"title":"Hello","slug":"hello","description":"d","body":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn update_tag_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/tags/missing", r#"{"id":"missing","name":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_tag_not_found() {
    let resp = app().oneshot(empty_request("DELETE", "/tags/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- snippets ---

#[tokio::test]
async fn create_snippet_resolves_known_tags() {
    let resp = seeded()
        .oneshot(json_request(
            "POST",
            "/snippets",
            r#"{"title":"Hello","slug":"hello","description":"d","body":"b","tags":["t2","nope","t1"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: SnippetBody = body_json(resp).await;
    let slugs: Vec<_> = body.snippet.tags.iter().map(|t| t.slug.as_str()).collect();
    assert_eq!(slugs, ["go", "rust"]);
    assert_eq!(body.snippet.created_at, body.snippet.updated_at);
}

#[tokio::test]
async fn create_snippet_without_tags() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/snippets",
            r#"{"title":"Hello","slug":"hello","description":"d","body":"b"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: SnippetBody = body_json(resp).await;
    assert!(body.snippet.tags.is_empty());
}

#[tokio::test]
async fn get_snippet_not_found() {
    let resp = app().oneshot(empty_request("GET", "/snippets/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn snippet_lifecycle() {
    use tower::Service;

    let mut app = seeded().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/snippets",
            r#"{"title":"Borrowing","slug":"borrowing","description":"d","body":"b","tags":["t1"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: SnippetBody = body_json(resp).await;
    let id = created.snippet.id.clone();

    // update — partial: only title
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/snippets/{id}"),
            &format!(r#"{{"id":"{id}","title":"Borrowing rules"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: SnippetBody = body_json(resp).await;
    assert_eq!(updated.snippet.title, "Borrowing rules");
    assert_eq!(updated.snippet.slug, "borrowing"); // unchanged
    assert_eq!(updated.snippet.tags.len(), 1);
    assert!(updated.snippet.updated_at >= created.snippet.updated_at);

    // deleting a tag removes it from the snippet
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/tags/t1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/snippets"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list: SnippetList = body_json(resp).await;
    assert_eq!(list.snippets.len(), 1);
    assert!(list.snippets[0].tags.is_empty());

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/snippets/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // get after delete — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/snippets/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
