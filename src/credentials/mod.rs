// Account and role enumeration through the SSO portal
mod fetcher;

pub use fetcher::AccountFetcher;

use crate::error::{Result, SsoError};
use crate::models::{AccountRole, CachedCredential};

/// Anything that can enumerate the roles a session may assume.
///
/// Any error aborts the whole run before the config file is touched.
#[allow(async_fn_in_trait)]
pub trait AccountRoleSource {
    async fn list_account_roles(&self, session: &CachedCredential) -> Result<Vec<AccountRole>>;
}

/// Enumerates accounts and roles with the AWS SSO portal API
#[derive(Debug, Default)]
pub struct SsoAccountLister;

impl SsoAccountLister {
    pub fn new() -> Self {
        Self
    }
}

impl AccountRoleSource for SsoAccountLister {
    async fn list_account_roles(&self, session: &CachedCredential) -> Result<Vec<AccountRole>> {
        if session.region.is_empty() {
            return Err(SsoError::ConfigError(
                "Cached SSO session has no region".to_string(),
            ));
        }

        let fetcher = AccountFetcher::new(&session.region).await?;
        let accounts = fetcher.list_accounts(&session.access_token).await?;
        tracing::debug!("Found {} accounts", accounts.len());

        let mut roles = Vec::new();
        for (account_id, account_name) in accounts {
            let role_names = fetcher
                .list_account_roles(&session.access_token, &account_id)
                .await?;

            for role_name in role_names {
                let role = AccountRole {
                    account_id: account_id.clone(),
                    account_name: account_name.clone(),
                    role_name,
                };
                tracing::debug!("Found role {} ({})", role.display_name(), role.account_id);
                roles.push(role);
            }
        }

        Ok(roles)
    }
}
