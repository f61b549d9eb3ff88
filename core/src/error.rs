//! Error types for the admin core.
//!
//! # Design
//! `ApiError` covers everything that can go wrong around one HTTP round-trip.
//! `NotFound` and `Conflict` get dedicated variants because the admin UI
//! reacts to them differently from an arbitrary failure status.
//! `SubmitError` is what a dialog submission can end in; validation failures
//! carry the per-field messages and never reach the network.

use thiserror::Error;

use crate::schema::ValidationErrors;

/// Errors returned by `AdminClient` parse methods and by transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404: the requested entity does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned 409, typically a duplicate slug.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The server returned a non-2xx status other than 404 and 409.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The host could not complete the round-trip at all.
    #[error("transport failed: {0}")]
    TransportError(String),
}

/// Rejected edits in an `EditDialog`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("field `{0}` is read-only")]
    ReadOnlyField(String),

    #[error("unknown field `{0}`")]
    UnknownField(String),
}

/// Ways a dialog submission can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("dialog is not open")]
    Closed,

    /// An update from this dialog is still in flight.
    #[error("an update is already pending")]
    Busy,

    /// The entity is still being fetched; the form is not populated yet.
    #[error("entity is still loading")]
    Loading,

    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}
