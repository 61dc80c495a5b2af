//! Account use cases.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::{check, require_scope, Result, ServiceError};
use crate::identity::{Identity, ACCOUNT_SCOPE};
use crate::keys::{key_precision, prefix, Account, Member, Record, Role};
use crate::models::{AccountDto, CreateAccountRequest};
use crate::slug::generate_unique_account_id;
use crate::storage::Store;
use crate::validation;

/// Conditional creates tried before giving up on a name.
pub const MAX_SLUG_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an account and make the caller its owner.
    ///
    /// The slug is claimed with a conditional create. Losing the claim to a
    /// concurrent creator re-runs slug generation.
    pub async fn create(
        &self,
        identity: &Identity,
        request: CreateAccountRequest,
    ) -> Result<AccountDto> {
        require_scope(identity, ACCOUNT_SCOPE)?;

        let mut errors = Vec::new();
        validation::require(&mut errors, "Name", request.name.as_deref());
        check(errors)?;
        let name = request.name.unwrap_or_default();

        let subject = identity.subject().ok_or(ServiceError::MissingClaim("sub"))?;
        let email = identity.email().ok_or(ServiceError::MissingClaim("email"))?;

        info!(name = %name, "Attempting to create account");

        let create_date = key_precision(Utc::now());
        let mut account = None;
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let id = generate_unique_account_id(self.store.as_ref(), &name).await?;
            let candidate = Account {
                id,
                name: name.clone(),
                create_date,
            };
            if self.store.put_if_absent(candidate.to_item()).await? {
                account = Some(candidate);
                break;
            }
            warn!(slug = %candidate.id, attempt, "Account slug claimed concurrently, retrying");
        }
        let account = account.ok_or_else(|| ServiceError::SlugExhausted {
            name: name.clone(),
            attempts: MAX_SLUG_ATTEMPTS,
        })?;
        info!(account_id = %account.id, "Account created");

        let owner = Member {
            account_id: account.id.clone(),
            role: Role::Owner,
            subject: subject.to_string(),
            email: email.to_string(),
            create_date,
        };
        self.store.put(owner.to_item()).await?;
        info!(account_id = %account.id, subject = %subject, "Owner member created");

        Ok(AccountDto::from(&account))
    }

    /// Accounts the caller is a member of, in membership order.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<AccountDto>> {
        require_scope(identity, ACCOUNT_SCOPE)?;
        let subject = identity.subject().ok_or(ServiceError::MissingClaim("sub"))?;

        info!(subject = %subject, "Listing accounts");

        let memberships = self
            .store
            .query_subject_index(subject, prefix::MEMBER)
            .await?;

        let mut seen = HashSet::new();
        let mut account_ids = Vec::new();
        for item in &memberships {
            let member = Member::from_item(item)?;
            if seen.insert(member.account_id.clone()) {
                account_ids.push(member.account_id);
            }
        }
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<_> = account_ids.iter().map(|id| Account::key_of(id)).collect();
        let mut found: HashMap<String, Account> = HashMap::with_capacity(keys.len());
        for item in self.store.batch_get(&keys).await? {
            let account = Account::from_item(&item)?;
            found.insert(account.id.clone(), account);
        }

        let accounts: Vec<AccountDto> = account_ids
            .iter()
            .filter_map(|id| found.get(id))
            .map(AccountDto::from)
            .collect();
        info!(count = accounts.len(), "Found accounts");
        Ok(accounts)
    }
}
