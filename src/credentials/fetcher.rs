use crate::error::{Result, SsoError};
use aws_sdk_sso::Client as SsoClient;

/// Thin wrapper over the SSO portal list operations
pub struct AccountFetcher {
    client: SsoClient,
}

impl AccountFetcher {
    pub async fn new(region: &str) -> Result<Self> {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let client = SsoClient::new(&config);

        Ok(Self { client })
    }

    /// List available accounts for the user as (account_id, account_name)
    pub async fn list_accounts(&self, access_token: &str) -> Result<Vec<(String, String)>> {
        let mut accounts = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.client.list_accounts().access_token(access_token);

            if let Some(token) = next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| SsoError::AwsSdk(format!("Failed to list accounts: {}", e)))?;

            for account in response.account_list() {
                let Some(account_id) = account.account_id() else {
                    continue;
                };
                // Fall back to the id so the profile name is never blank
                let account_name = account.account_name().unwrap_or(account_id);
                accounts.push((account_id.to_string(), account_name.to_string()));
            }

            next_token = response.next_token().map(|s| s.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(accounts)
    }

    /// List available roles for an account
    pub async fn list_account_roles(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<Vec<String>> {
        let mut roles = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_account_roles()
                .access_token(access_token)
                .account_id(account_id);

            if let Some(token) = next_token {
                request = request.next_token(token);
            }

            let response = request.send().await.map_err(|e| {
                SsoError::AwsSdk(format!(
                    "Failed to list roles for account {}: {}",
                    account_id, e
                ))
            })?;

            for role in response.role_list() {
                if let Some(role_name) = role.role_name() {
                    roles.push(role_name.to_string());
                }
            }

            next_token = response.next_token().map(|s| s.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(roles)
    }
}
