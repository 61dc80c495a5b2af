//! Use cases.
//!
//! Each service checks the caller's scope, validates its input and then
//! drives the key codec, slug generator, fan-out and query engine against
//! the shared [`Store`].

mod accounts;
mod events;
mod tags;

use std::sync::Arc;

pub use accounts::AccountService;
pub use events::EventService;
pub use tags::TagService;

use crate::identity::Identity;
use crate::keys::KeyError;
use crate::query::QueryError;
use crate::storage::{StorageError, Store};
use crate::validation::FieldError;

/// Errors a use case can end with.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("invalid request")]
    InvalidRequest,

    #[error("caller lacks scope: {0}")]
    Unauthorized(&'static str),

    #[error("identity is missing the {0} claim")]
    MissingClaim(&'static str),

    #[error("no free account slug for {name:?} after {attempts} attempts")]
    SlugExhausted { name: String, attempts: u32 },

    #[error("stored record is malformed: {0}")]
    Key(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// HTTP-style status class of this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidRequest => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::MissingClaim(_)
            | ServiceError::SlugExhausted { .. }
            | ServiceError::Key(_)
            | ServiceError::Storage(_) => 500,
        }
    }

    /// Field errors reported to the client, if this error has any.
    pub fn field_errors(&self) -> Option<Vec<FieldError>> {
        match self {
            ServiceError::Validation(errors) => Some(errors.clone()),
            ServiceError::InvalidRequest => Some(vec![FieldError::invalid_request("Body")]),
            ServiceError::Unauthorized(_) => Some(vec![FieldError::unauthorized()]),
            _ => None,
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Invalid(errors) => ServiceError::Validation(errors),
            QueryError::Key(e) => ServiceError::Key(e),
            QueryError::Storage(e) => ServiceError::Storage(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Fail with [`ServiceError::Unauthorized`] unless `scope` was granted.
pub fn require_scope(identity: &Identity, scope: &'static str) -> Result<()> {
    if identity.has_scope(scope) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(scope))
    }
}

/// Turn collected field errors into a result.
pub(crate) fn check(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}

/// All use cases over one store.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub events: EventService,
    pub tags: TagService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            events: EventService::new(store.clone()),
            tags: TagService::new(store),
        }
    }
}
