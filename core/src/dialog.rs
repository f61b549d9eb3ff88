//! Edit dialog state machine for a single admin entity.
//!
//! # Design
//! `EditDialog` never performs I/O. Opening it may hand back a `FetchTicket`
//! that the host executes and feeds to `apply_fetch`; a valid `submit` hands
//! back the update payload that the host sends and then reports through
//! `complete_submit`. Every open starts a new cycle, and a fetch result is
//! only applied if its ticket belongs to the current cycle, so a slow
//! response from an earlier open can never overwrite a newer one.
//!
//! Form population is idempotent: it runs when the dialog opens with a
//! cached entity and when fresh entity data arrives while the dialog is
//! open, and it always writes the same fields from the same entity.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, DialogError, SubmitError};
use crate::form::FormState;
use crate::resource::Resource;
use crate::schema::Schema;
use crate::slug::to_slug;

/// Field rewritten by `EditDialog::format_slug_field`.
pub const SLUG_FIELD: &str = "slug";

/// Progress of the entity fetch backing the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// A fetch the host must execute for the dialog's current open cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    id: String,
    generation: u64,
}

impl FetchTicket {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub struct EditDialog<R: Resource> {
    id: String,
    open: bool,
    form: FormState,
    schema: Schema,
    cached: Option<R::Entity>,
    fetch: FetchState,
    generation: u64,
    pending: bool,
    mutation_error: Option<String>,
}

impl<R: Resource> EditDialog<R> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            open: false,
            form: FormState::new(),
            schema: R::update_schema(),
            cached: None,
            fetch: FetchState::Idle,
            generation: 0,
            pending: false,
            mutation_error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open and waiting for the entity; the form is not populated yet.
    pub fn is_loading(&self) -> bool {
        self.open && self.fetch == FetchState::Loading
    }

    /// An update is in flight; submitting again is refused.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn fetch_state(&self) -> &FetchState {
        &self.fetch
    }

    pub fn fetch_error(&self) -> Option<&str> {
        match &self.fetch {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn mutation_error(&self) -> Option<&str> {
        self.mutation_error.as_deref()
    }

    pub fn cached(&self) -> Option<&R::Entity> {
        self.cached.as_ref()
    }

    /// Open the dialog. Returns a ticket when the entity has to be fetched;
    /// with a cached entity the form is populated right away. Opening an
    /// already open dialog changes nothing.
    pub fn open(&mut self) -> Option<FetchTicket> {
        if self.open {
            return None;
        }
        self.open = true;
        self.generation += 1;
        self.mutation_error = None;
        debug!(resource = R::SINGULAR, id = %self.id, generation = self.generation, "edit dialog opened");

        if let Some(entity) = self.cached.clone() {
            self.populate(&entity);
            return None;
        }
        self.fetch = FetchState::Loading;
        Some(self.ticket())
    }

    /// Close the dialog. Work already handed to the host is not cancelled.
    pub fn close(&mut self) {
        if self.open {
            debug!(resource = R::SINGULAR, id = %self.id, "edit dialog closed");
        }
        self.open = false;
    }

    /// Drop the cached entity and retire every outstanding ticket. While
    /// open, returns a ticket for the refetch.
    pub fn invalidate(&mut self) -> Option<FetchTicket> {
        self.cached = None;
        self.generation += 1;
        if !self.open {
            self.fetch = FetchState::Idle;
            return None;
        }
        self.fetch = FetchState::Loading;
        Some(self.ticket())
    }

    /// Feed the outcome of a fetch. Returns `false` if the ticket is stale
    /// and the result was ignored.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, result: Result<R::Entity, ApiError>) -> bool {
        if ticket.generation != self.generation || ticket.id != self.id {
            warn!(
                resource = R::SINGULAR,
                id = %ticket.id,
                stale = ticket.generation,
                current = self.generation,
                "ignoring stale fetch result"
            );
            return false;
        }

        match result {
            Ok(entity) => {
                self.fetch = FetchState::Loaded;
                if self.open {
                    self.populate(&entity);
                }
                self.cached = Some(entity);
            }
            Err(err) => {
                warn!(resource = R::SINGULAR, id = %self.id, error = %err, "entity fetch failed");
                self.fetch = FetchState::Failed(err.to_string());
            }
        }
        true
    }

    /// Record a user edit.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Result<(), DialogError> {
        if R::READ_ONLY_FIELDS.contains(&name) {
            return Err(DialogError::ReadOnlyField(name.to_string()));
        }
        if self.schema.get(name).is_none() {
            return Err(DialogError::UnknownField(name.to_string()));
        }
        self.form.set_value(name, value);
        Ok(())
    }

    /// Normalize the slug field in place. Blank input is left alone and no
    /// validation runs.
    pub fn format_slug_field(&mut self) {
        let formatted = match self.form.text(SLUG_FIELD).map(str::trim) {
            Some(raw) if !raw.is_empty() => to_slug(raw),
            _ => return,
        };
        self.form.set_value(SLUG_FIELD, formatted);
    }

    /// Validate the form against the update schema. On success the dialog
    /// becomes pending and the payload is returned for the host to send.
    pub fn submit(&mut self) -> Result<R::Update, SubmitError> {
        if !self.open {
            return Err(SubmitError::Closed);
        }
        if self.pending {
            return Err(SubmitError::Busy);
        }
        if self.fetch == FetchState::Loading {
            return Err(SubmitError::Loading);
        }

        let payload = self.form.handle_submit::<R::Update>(&self.schema).map_err(|errors| {
            debug!(resource = R::SINGULAR, id = %self.id, %errors, "submit rejected by validation");
            SubmitError::Invalid(errors)
        })?;
        self.pending = true;
        self.mutation_error = None;
        Ok(payload)
    }

    /// Report the outcome of the update sent after `submit`. Success closes
    /// the dialog and retires outstanding fetch tickets, since the returned
    /// entity is newer than anything they could bring back. Failure keeps
    /// the dialog open with the form untouched.
    pub fn complete_submit(&mut self, result: Result<R::Entity, ApiError>) -> Result<(), ApiError> {
        self.pending = false;
        match result {
            Ok(entity) => {
                debug!(resource = R::SINGULAR, id = %self.id, "entity updated");
                self.generation += 1;
                self.cached = Some(entity);
                self.fetch = FetchState::Loaded;
                self.open = false;
                Ok(())
            }
            Err(err) => {
                warn!(resource = R::SINGULAR, id = %self.id, error = %err, "entity update failed");
                self.mutation_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn ticket(&self) -> FetchTicket {
        FetchTicket {
            id: self.id.clone(),
            generation: self.generation,
        }
    }

    fn populate(&mut self, entity: &R::Entity) {
        for (name, value) in R::form_values(entity) {
            self.form.set_value(name, value);
        }
        self.form.clear_errors();
        self.fetch = FetchState::Loaded;
    }
}
