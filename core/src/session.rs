//! Drives edit dialogs through a host-supplied transport.
//!
//! # Design
//! `Session` is the only place where a request built by `AdminClient` meets
//! a `Transport`. It executes the fetch a dialog asks for on open and the
//! update a valid submit produces. A submit that fails validation never
//! reaches the transport.

use tracing::debug;

use crate::client::AdminClient;
use crate::dialog::EditDialog;
use crate::error::{ApiError, SubmitError};
use crate::http::{HttpRequest, HttpResponse};
use crate::resource::Resource;

/// Executes one HTTP round-trip on behalf of the core.
///
/// Implementations should return non-2xx responses as data and reserve
/// `Err` for failures where no response was received.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[derive(Debug, Clone)]
pub struct Session<T> {
    client: AdminClient,
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(client: AdminClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &AdminClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn list<R: Resource>(&self) -> Result<Vec<R::Entity>, ApiError> {
        let response = self.transport.execute(self.client.build_list::<R>())?;
        self.client.parse_list::<R>(response)
    }

    pub fn fetch<R: Resource>(&self, id: &str) -> Result<R::Entity, ApiError> {
        let response = self.transport.execute(self.client.build_get::<R>(id))?;
        self.client.parse_get::<R>(response)
    }

    pub fn create<R: Resource>(&self, input: &R::Create) -> Result<R::Entity, ApiError> {
        let response = self.transport.execute(self.client.build_create::<R>(input)?)?;
        self.client.parse_create::<R>(response)
    }

    pub fn update<R: Resource>(&self, input: &R::Update) -> Result<R::Entity, ApiError> {
        let response = self.transport.execute(self.client.build_update::<R>(input)?)?;
        self.client.parse_update::<R>(response)
    }

    pub fn delete<R: Resource>(&self, id: &str) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete::<R>(id))?;
        self.client.parse_delete::<R>(response)
    }

    /// Open `dialog`, fetching its entity unless it is already cached.
    pub fn open<R: Resource>(&self, dialog: &mut EditDialog<R>) {
        if let Some(ticket) = dialog.open() {
            debug!(resource = R::SINGULAR, id = %ticket.id(), "fetching entity for edit dialog");
            let result = self.fetch::<R>(ticket.id());
            dialog.apply_fetch(ticket, result);
        }
    }

    /// Submit `dialog` and send the update if the form is valid.
    pub fn submit<R: Resource>(&self, dialog: &mut EditDialog<R>) -> Result<(), SubmitError> {
        let payload = dialog.submit()?;
        let result = self.update::<R>(&payload);
        dialog.complete_submit(result)?;
        Ok(())
    }
}
