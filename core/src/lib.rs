//! Sans-IO core for editing admin entities (tags and snippets).
//!
//! # Overview
//! Declares the create/update payloads and their validation schemas, keeps
//! the state of an entity edit dialog, and builds/parses the HTTP exchanges
//! the dialog needs. The host executes the actual round-trips, either by
//! hand (`build_*` / `parse_*`) or through a `session::Transport`.
//!
//! # Design
//! - `AdminClient` is stateless; it holds only `base_url`.
//! - Update payloads are derived from create payloads (partial plus a
//!   required `id`), never declared twice.
//! - `EditDialog` is a plain state machine: opening hands out fetch tickets,
//!   submitting hands out validated payloads, and the host reports results.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod dialog;
pub mod error;
pub mod form;
pub mod http;
pub mod resource;
pub mod schema;
pub mod session;
pub mod slug;
pub mod types;

pub use client::AdminClient;
pub use dialog::{EditDialog, FetchState, FetchTicket};
pub use error::{ApiError, DialogError, SubmitError};
pub use form::FormState;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::{Listing, Resource, Snippets, Tags};
pub use schema::{FieldKind, FieldSpec, Rule, Schema, ValidationErrors};
pub use session::{Session, Transport};
pub use slug::{is_valid_slug, to_slug};
pub use types::{CreateSnippet, CreateTag, ListSnippets, ListTags, Snippet, SnippetEntry, Tag, UpdateSnippet, UpdateTag};
