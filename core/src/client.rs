//! Stateless HTTP request builder and response parser for the admin API.
//!
//! # Design
//! `AdminClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`, and
//! every method is generic over the `Resource` it targets. Single entities
//! travel wrapped under their singular key (`{"tag": {...}}`), listings under
//! the plural key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::resource::{Listing, Resource};

/// Synchronous, stateless client for the admin API.
#[derive(Debug, Clone)]
pub struct AdminClient {
    base_url: String,
}

impl AdminClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list<R: Resource>(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.collection_path::<R>(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get<R: Resource>(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.entity_path::<R>(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create<R: Resource>(&self, input: &R::Create) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.collection_path::<R>(),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    /// The target id is taken from the payload itself.
    pub fn build_update<R: Resource>(&self, input: &R::Update) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: self.entity_path::<R>(R::update_id(input)),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_delete<R: Resource>(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.entity_path::<R>(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Vec<R::Entity>, ApiError> {
        check_status(&response, 200)?;
        let listing: R::List = from_json(&response.body)?;
        Ok(listing.into_items())
    }

    pub fn parse_get<R: Resource>(&self, response: HttpResponse) -> Result<R::Entity, ApiError> {
        check_status(&response, 200)?;
        unwrap_entity::<R>(&response.body)
    }

    pub fn parse_create<R: Resource>(&self, response: HttpResponse) -> Result<R::Entity, ApiError> {
        check_status(&response, 201)?;
        unwrap_entity::<R>(&response.body)
    }

    pub fn parse_update<R: Resource>(&self, response: HttpResponse) -> Result<R::Entity, ApiError> {
        check_status(&response, 200)?;
        unwrap_entity::<R>(&response.body)
    }

    pub fn parse_delete<R: Resource>(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)?;
        Ok(())
    }

    fn collection_path<R: Resource>(&self) -> String {
        format!("{}/{}", self.base_url, R::COLLECTION)
    }

    fn entity_path<R: Resource>(&self, id: &str) -> String {
        format!("{}/{}/{id}", self.base_url, R::COLLECTION)
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn to_json<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Take the entity out of its `{"<singular>": ...}` envelope.
fn unwrap_entity<R: Resource>(body: &str) -> Result<R::Entity, ApiError> {
    let mut envelope: Value = from_json(body)?;
    let inner = envelope
        .get_mut(R::SINGULAR)
        .map(Value::take)
        .ok_or_else(|| ApiError::DeserializationError(format!("missing `{}` in response", R::SINGULAR)))?;
    serde_json::from_value(inner).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        status if status == expected => Ok(()),
        404 => Err(ApiError::NotFound),
        409 => Err(ApiError::Conflict(error_message(&response.body))),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

/// The `error` field of a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
