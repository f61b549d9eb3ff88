use std::{
    collections::BTreeMap,
    sync::{Arc, LazyLock},
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

pub mod config;

pub use config::{init_tracing, Config};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub slug: String,
}

#[derive(Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSnippet {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct UpdateSnippet {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagBody {
    pub tag: Tag,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagList {
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnippetBody {
    pub snippet: Snippet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnippetList {
    pub snippets: Vec<Snippet>,
}

/// Stored snippet; tags are kept as ids and resolved on every read.
#[derive(Clone, Debug)]
struct SnippetRow {
    id: String,
    title: String,
    slug: String,
    description: String,
    body: String,
    tag_ids: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Store {
    tags: BTreeMap<String, Tag>,
    snippets: BTreeMap<String, SnippetRow>,
}

impl Store {
    /// Insert a tag with a fixed id, for seeding tests and demos.
    pub fn with_tag(mut self, id: &str, name: &str, slug: &str) -> Self {
        let tag = Tag {
            id: id.to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        self.tags.insert(tag.id.clone(), tag);
        self
    }

    fn tag_slug_taken(&self, slug: &str, except: Option<&str>) -> bool {
        self.tags
            .values()
            .any(|tag| tag.slug == slug && Some(tag.id.as_str()) != except)
    }

    fn snippet_slug_taken(&self, slug: &str, except: Option<&str>) -> bool {
        self.snippets
            .values()
            .any(|row| row.slug == slug && Some(row.id.as_str()) != except)
    }

    /// Unknown tag ids are dropped.
    fn known_tag_ids(&self, ids: Vec<String>) -> Vec<String> {
        ids.into_iter().filter(|id| self.tags.contains_key(id)).collect()
    }

    fn render(&self, row: &SnippetRow) -> Snippet {
        Snippet {
            id: row.id.clone(),
            title: row.title.clone(),
            slug: row.slug.clone(),
            description: row.description.clone(),
            body: row.body.clone(),
            tags: row
                .tag_ids
                .iter()
                .filter_map(|id| self.tags.get(id).cloned())
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub enum AppError {
    NotFound,
    Conflict(String),
    Invalid(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            AppError::Invalid(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern is a valid regex"));

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::Invalid(format!("`{field}` must not be empty")));
    }
    Ok(())
}

fn require_slug(value: &str) -> Result<(), AppError> {
    if !SLUG_PATTERN.is_match(value) {
        return Err(AppError::Invalid(format!(
            "slug `{value}` may only contain lowercase letters, digits and hyphens"
        )));
    }
    Ok(())
}

fn optional<T: AsRef<str>>(
    value: &Option<T>,
    check: impl FnOnce(&str) -> Result<(), AppError>,
) -> Result<(), AppError> {
    value.as_ref().map_or(Ok(()), |v| check(v.as_ref()))
}

impl CreateTag {
    fn validate(&self) -> Result<(), AppError> {
        require_text("name", &self.name)?;
        require_slug(&self.slug)
    }
}

impl UpdateTag {
    fn validate(&self) -> Result<(), AppError> {
        optional(&self.name, |v| require_text("name", v))?;
        optional(&self.slug, require_slug)
    }
}

impl CreateSnippet {
    fn validate(&self) -> Result<(), AppError> {
        require_text("title", &self.title)?;
        require_slug(&self.slug)?;
        require_text("description", &self.description)?;
        require_text("body", &self.body)
    }
}

impl UpdateSnippet {
    fn validate(&self) -> Result<(), AppError> {
        optional(&self.title, |v| require_text("title", v))?;
        optional(&self.slug, require_slug)?;
        optional(&self.description, |v| require_text("description", v))?;
        optional(&self.body, |v| require_text("body", v))
    }
}

fn slug_conflict(slug: &str) -> AppError {
    AppError::Conflict(format!("slug `{slug}` is already taken"))
}

pub fn app() -> Router {
    app_with_store(Store::default())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{id}", get(get_tag).put(update_tag).delete(delete_tag))
        .route("/snippets", get(list_snippets).post(create_snippet))
        .route(
            "/snippets/{id}",
            get(get_snippet).put(update_snippet).delete(delete_snippet),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_store(listener, Store::default()).await
}

pub async fn run_with_store(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(store)).await
}

// --- tags ---

async fn list_tags(State(db): State<Db>) -> Json<TagList> {
    let store = db.read().await;
    Json(TagList {
        tags: store.tags.values().cloned().collect(),
    })
}

async fn create_tag(
    State(db): State<Db>,
    Json(input): Json<CreateTag>,
) -> Result<(StatusCode, Json<TagBody>), AppError> {
    input.validate()?;
    let mut store = db.write().await;
    if store.tag_slug_taken(&input.slug, None) {
        return Err(slug_conflict(&input.slug));
    }
    let tag = Tag {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        slug: input.slug,
    };
    store.tags.insert(tag.id.clone(), tag.clone());
    info!(id = %tag.id, slug = %tag.slug, "tag created");
    Ok((StatusCode::CREATED, Json(TagBody { tag })))
}

async fn get_tag(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<TagBody>, AppError> {
    let store = db.read().await;
    let tag = store.tags.get(&id).cloned().ok_or(AppError::NotFound)?;
    Ok(Json(TagBody { tag }))
}

async fn update_tag(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTag>,
) -> Result<Json<TagBody>, AppError> {
    let mut store = db.write().await;
    if !store.tags.contains_key(&id) {
        return Err(AppError::NotFound);
    }
    input.validate()?;
    if let Some(slug) = &input.slug {
        if store.tag_slug_taken(slug, Some(&id)) {
            return Err(slug_conflict(slug));
        }
    }
    let tag = store.tags.get_mut(&id).ok_or(AppError::NotFound)?;
    if let Some(name) = input.name {
        tag.name = name;
    }
    if let Some(slug) = input.slug {
        tag.slug = slug;
    }
    info!(id = %tag.id, "tag updated");
    Ok(Json(TagBody { tag: tag.clone() }))
}

async fn delete_tag(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let mut store = db.write().await;
    store.tags.remove(&id).ok_or(AppError::NotFound)?;
    for row in store.snippets.values_mut() {
        row.tag_ids.retain(|tag_id| *tag_id != id);
    }
    info!(%id, "tag deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- snippets ---

async fn list_snippets(State(db): State<Db>) -> Json<SnippetList> {
    let store = db.read().await;
    Json(SnippetList {
        snippets: store.snippets.values().map(|row| store.render(row)).collect(),
    })
}

async fn create_snippet(
    State(db): State<Db>,
    Json(input): Json<CreateSnippet>,
) -> Result<(StatusCode, Json<SnippetBody>), AppError> {
    input.validate()?;
    let mut store = db.write().await;
    if store.snippet_slug_taken(&input.slug, None) {
        return Err(slug_conflict(&input.slug));
    }
    let now = Utc::now();
    let row = SnippetRow {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        slug: input.slug,
        description: input.description,
        body: input.body,
        tag_ids: store.known_tag_ids(input.tags.unwrap_or_default()),
        created_at: now,
        updated_at: now,
    };
    store.snippets.insert(row.id.clone(), row.clone());
    info!(id = %row.id, slug = %row.slug, "snippet created");
    let snippet = store.render(&row);
    Ok((StatusCode::CREATED, Json(SnippetBody { snippet })))
}

async fn get_snippet(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<SnippetBody>, AppError> {
    let store = db.read().await;
    let row = store.snippets.get(&id).ok_or(AppError::NotFound)?;
    Ok(Json(SnippetBody {
        snippet: store.render(row),
    }))
}

async fn update_snippet(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateSnippet>,
) -> Result<Json<SnippetBody>, AppError> {
    let mut store = db.write().await;
    if !store.snippets.contains_key(&id) {
        return Err(AppError::NotFound);
    }
    input.validate()?;
    if let Some(slug) = &input.slug {
        if store.snippet_slug_taken(slug, Some(&id)) {
            return Err(slug_conflict(slug));
        }
    }
    let tag_ids = input.tags.map(|ids| store.known_tag_ids(ids));
    let row = store.snippets.get_mut(&id).ok_or(AppError::NotFound)?;
    if let Some(title) = input.title {
        row.title = title;
    }
    if let Some(slug) = input.slug {
        row.slug = slug;
    }
    if let Some(description) = input.description {
        row.description = description;
    }
    if let Some(body) = input.body {
        row.body = body;
    }
    if let Some(tag_ids) = tag_ids {
        row.tag_ids = tag_ids;
    }
    row.updated_at = Utc::now();
    let row = row.clone();
    info!(id = %row.id, "snippet updated");
    Ok(Json(SnippetBody {
        snippet: store.render(&row),
    }))
}

async fn delete_snippet(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut store = db.write().await;
    store.snippets.remove(&id).ok_or(AppError::NotFound)?;
    info!(%id, "snippet deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_serializes_to_json() {
        let tag = Tag {
            id: "t1".to_string(),
            name: "Rust".to_string(),
            slug: "rust".to_string(),
        };
        let json = serde_json::to_value(TagBody { tag }).unwrap();
        assert_eq!(json["tag"]["id"], "t1");
        assert_eq!(json["tag"]["slug"], "rust");
    }

    #[test]
    fn snippet_uses_camel_case_timestamps() {
        let store = Store::default().with_tag("t1", "Rust", "rust");
        let now = Utc::now();
        let row = SnippetRow {
            id: "s1".to_string(),
            title: "T".to_string(),
            slug: "t".to_string(),
            description: "D".to_string(),
            body: "B".to_string(),
            tag_ids: vec!["t1".to_string(), "gone".to_string()],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(store.render(&row)).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["tags"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn update_tag_all_fields_optional() {
        let input: UpdateTag = serde_json::from_str(r#"{"id":"t1"}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.slug.is_none());
    }

    #[test]
    fn create_snippet_rejects_missing_body() {
        let result: Result<CreateSnippet, _> =
            serde_json::from_str(r#"{"title":"t","slug":"s","description":"d"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn payload_validation_matches_schema_rules() {
        let valid = CreateTag {
            name: "Rust".to_string(),
            slug: "rust-2024".to_string(),
        };
        assert!(valid.validate().is_ok());
        let bad_slug = CreateTag {
            name: "Rust".to_string(),
            slug: "Not A Slug".to_string(),
        };
        assert!(matches!(bad_slug.validate(), Err(AppError::Invalid(_))));

        let absent = UpdateSnippet {
            title: None,
            slug: None,
            description: None,
            body: None,
            tags: None,
        };
        assert!(absent.validate().is_ok());
        let empty_body = UpdateSnippet {
            body: Some(String::new()),
            ..absent
        };
        assert!(matches!(empty_body.validate(), Err(AppError::Invalid(_))));
    }

    #[test]
    fn slug_uniqueness_ignores_the_entity_itself() {
        let store = Store::default().with_tag("t1", "Rust", "rust");
        assert!(store.tag_slug_taken("rust", None));
        assert!(!store.tag_slug_taken("rust", Some("t1")));
        assert!(!store.tag_slug_taken("go", None));
    }
}
