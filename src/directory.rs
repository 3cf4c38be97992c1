use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Display name used for records that carry no account id.
pub const UNKNOWN_ACCOUNT: &str = "Unknown";

/// Remote account-id to name lookup (AWS Organizations DescribeAccount).
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn account_name(&self, account_id: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountName {
    Resolved(String),
    /// Lookup failed, the account id stands in for the name.
    Fallback(String),
}

impl AccountName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolved(name) | Self::Fallback(name) => name,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Per-run memoizing account directory. Each id is looked up at most once,
/// failures included.
pub struct AccountDirectory<'a> {
    lookup: &'a dyn AccountLookup,
    cache: HashMap<String, AccountName>,
    lookups: usize,
}

impl<'a> AccountDirectory<'a> {
    pub fn new(lookup: &'a dyn AccountLookup) -> Self {
        Self {
            lookup,
            cache: HashMap::new(),
            lookups: 0,
        }
    }

    pub async fn resolve(&mut self, account_id: &str) -> AccountName {
        if let Some(name) = self.cache.get(account_id) {
            return name.clone();
        }

        self.lookups += 1;
        let name = match self.lookup.account_name(account_id).await {
            Ok(name) => {
                debug!(account_id = %account_id, account_name = %name, "Account name resolved");
                AccountName::Resolved(name)
            }
            Err(e) => {
                warn!(
                    account_id = %account_id,
                    error = %e,
                    "Could not resolve account name, using account id"
                );
                AccountName::Fallback(account_id.to_string())
            }
        };

        self.cache.insert(account_id.to_string(), name.clone());
        name
    }

    pub async fn display_name(&mut self, account_id: Option<&str>) -> String {
        match account_id {
            Some(id) => self.resolve(id).await.as_str().to_string(),
            None => UNKNOWN_ACCOUNT.to_string(),
        }
    }

    /// Number of remote lookups performed so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    pub fn fallback_count(&self) -> usize {
        self.cache.values().filter(|n| n.is_fallback()).count()
    }
}
