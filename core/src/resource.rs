//! Admin resources and the wiring between their payloads, schemas and forms.
//!
//! # Design
//! `Resource` is implemented by zero-sized markers (`Tags`, `Snippets`) so
//! the client and the edit dialog can be written once and instantiated per
//! entity type. Nothing here performs I/O.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::schema::{Schema, ID_FIELD};
use crate::types::{CreateSnippet, CreateTag, ListSnippets, ListTags, Snippet, Tag, UpdateSnippet, UpdateTag};

/// A listing response that wraps a sequence of items.
pub trait Listing: DeserializeOwned {
    type Item;

    fn into_items(self) -> Vec<Self::Item>;
}

/// An entity collection exposed by the admin API.
pub trait Resource {
    /// Plural path segment and listing key, e.g. `tags`.
    const COLLECTION: &'static str;
    /// Key wrapping a single entity in responses, e.g. `tag`.
    const SINGULAR: &'static str;
    /// Fields shown in the edit form but never editable.
    const READ_ONLY_FIELDS: &'static [&'static str] = &[ID_FIELD];

    type Entity: Debug + Clone + DeserializeOwned;
    type Create: Serialize;
    type Update: Debug + Serialize + DeserializeOwned;
    type List: Listing<Item = Self::Entity>;

    fn create_schema() -> Schema;

    fn update_schema() -> Schema;

    fn entity_id(entity: &Self::Entity) -> &str;

    fn update_id(update: &Self::Update) -> &str;

    /// Values the edit form is filled with for `entity`.
    fn form_values(entity: &Self::Entity) -> Vec<(&'static str, Value)>;
}

#[derive(Debug, Clone, Copy)]
pub struct Tags;

impl Resource for Tags {
    const COLLECTION: &'static str = "tags";
    const SINGULAR: &'static str = "tag";

    type Entity = Tag;
    type Create = CreateTag;
    type Update = UpdateTag;
    type List = ListTags;

    fn create_schema() -> Schema {
        CreateTag::schema()
    }

    fn update_schema() -> Schema {
        UpdateTag::schema()
    }

    fn entity_id(entity: &Tag) -> &str {
        &entity.id
    }

    fn update_id(update: &UpdateTag) -> &str {
        &update.id
    }

    fn form_values(tag: &Tag) -> Vec<(&'static str, Value)> {
        vec![
            ("name", json!(tag.name)),
            ("slug", json!(tag.slug)),
            (ID_FIELD, json!(tag.id)),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Snippets;

impl Resource for Snippets {
    const COLLECTION: &'static str = "snippets";
    const SINGULAR: &'static str = "snippet";

    type Entity = Snippet;
    type Create = CreateSnippet;
    type Update = UpdateSnippet;
    type List = ListSnippets;

    fn create_schema() -> Schema {
        CreateSnippet::schema()
    }

    fn update_schema() -> Schema {
        UpdateSnippet::schema()
    }

    fn entity_id(entity: &Snippet) -> &str {
        &entity.id
    }

    fn update_id(update: &UpdateSnippet) -> &str {
        &update.id
    }

    fn form_values(snippet: &Snippet) -> Vec<(&'static str, Value)> {
        let tag_ids: Vec<&str> = snippet.tags.iter().map(|tag| tag.id.as_str()).collect();
        vec![
            ("title", json!(snippet.title)),
            ("slug", json!(snippet.slug)),
            ("description", json!(snippet.description)),
            ("body", json!(snippet.body)),
            ("tags", json!(tag_ids)),
            (ID_FIELD, json!(snippet.id)),
        ]
    }
}
