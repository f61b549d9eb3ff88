//! Domain DTOs for the admin API.
//!
//! # Design
//! Create and update payloads are generated by `entity_schema!` from a single
//! field list, so the update payload is always the create payload made
//! partial plus a required `id`. The snippet read model is not declared on
//! its own: `Snippet` is whatever element type the snippet listing returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::Listing;
use crate::schema::{entity_schema, Rule, MIN_LENGTH_MESSAGE};

/// A tag as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
}

entity_schema! {
    /// Request payload for creating a tag.
    create CreateTag;
    /// Partial tag update. Omitted fields remain unchanged on the server.
    update UpdateTag;
    {
        name: String => [Rule::min_length(1, MIN_LENGTH_MESSAGE)],
        slug: String => [Rule::slug(), Rule::min_length(1, MIN_LENGTH_MESSAGE)],
    }
}

entity_schema! {
    /// Request payload for creating a snippet. `tags` holds tag ids in display
    /// order.
    create CreateSnippet;
    /// Partial snippet update. Omitted fields remain unchanged on the server.
    update UpdateSnippet;
    {
        title: String => [Rule::min_length(1, MIN_LENGTH_MESSAGE)],
        slug: String => [Rule::slug(), Rule::min_length(1, MIN_LENGTH_MESSAGE)],
        description: String => [Rule::min_length(1, MIN_LENGTH_MESSAGE)],
        body: String => [Rule::min_length(1, MIN_LENGTH_MESSAGE)],
        tags: Option<Vec<String>>,
    }
}

/// Response body of the tag listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListTags {
    pub tags: Vec<Tag>,
}

impl Listing for ListTags {
    type Item = Tag;

    fn into_items(self) -> Vec<Tag> {
        self.tags
    }
}

/// Response body of the snippet listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListSnippets {
    pub snippets: Vec<SnippetEntry>,
}

/// One element of [`ListSnippets`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnippetEntry {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing for ListSnippets {
    type Item = SnippetEntry;

    fn into_items(self) -> Vec<SnippetEntry> {
        self.snippets
    }
}

/// Snippet read model: the element type of the snippet listing.
pub type Snippet = <ListSnippets as Listing>::Item;
