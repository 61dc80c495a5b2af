//! Caller identity as issued by the authorizer.
//!
//! The identity is trusted verbatim; only scope membership is checked here.

use serde::{Deserialize, Serialize};

/// Scope required by account operations.
pub const ACCOUNT_SCOPE: &str = "account";
/// Scope required by event and tag operations.
pub const EVENT_SCOPE: &str = "event";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    #[serde(alias = "sub")]
    pub subject: Option<String>,
    pub email: Option<String>,
    pub scopes: Vec<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            email: Some(email.into()),
            scopes: Vec::new(),
        }
    }

    /// Add scopes from a space-separated scope claim.
    pub fn with_scope_claim(mut self, claim: &str) -> Self {
        self.scopes
            .extend(claim.split_whitespace().map(str::to_string));
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|granted| granted == scope)
    }

    /// Non-blank subject claim.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Non-blank email claim.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.trim().is_empty())
    }
}
