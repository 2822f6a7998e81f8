use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

/// Cached SSO-OIDC token as written by the AWS CLI to ~/.aws/sso/cache/
///
/// Every field is optional on disk; missing strings decode as empty and a
/// missing or null expiry decodes as `None`, which sorts before any timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CachedCredential {
    #[serde(rename = "startUrl", alias = "start_url")]
    pub start_url: String,

    pub region: String,

    #[serde(rename = "accessToken", alias = "access_token")]
    pub access_token: String,

    #[serde(
        rename = "expiresAt",
        alias = "expires_at",
        deserialize_with = "deserialize_expiry"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedCredential {
    /// Only entries carrying a token can be used to call the SSO portal.
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Expiry rendered for diagnostics
    pub fn expiration_display(&self) -> String {
        match self.expires_at {
            Some(at) => at.to_rfc3339(),
            None => "no expiry".to_string(),
        }
    }
}

/// Accepts RFC 3339 as well as the `2024-01-01T00:00:00UTC` form older
/// AWS CLI releases write.
fn deserialize_expiry<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%SUTC")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("invalid expiresAt '{}': {}", raw, e)))
}

/// Represents a role within an AWS account
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountRole {
    pub account_id: String,
    pub account_name: String,
    pub role_name: String,
}

impl AccountRole {
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.account_name, self.role_name)
    }

    pub fn profile_name(&self) -> String {
        derive_profile_name(&self.account_name, &self.role_name)
    }
}

/// Build a section-safe profile name from an account and role name.
///
/// The result is lowercase and every run of characters outside `[a-z0-9]`
/// collapses to a single hyphen.
pub fn derive_profile_name(account_name: &str, role_name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators =
        SEPARATORS.get_or_init(|| Regex::new("[^a-z0-9]+").expect("static pattern is valid"));

    let combined = format!("{}-{}", account_name, role_name).to_lowercase();
    separators.replace_all(&combined, "-").into_owned()
}

/// One generated `[profile <name>]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub name: String,
    pub sso_start_url: String,
    pub sso_account_id: String,
    pub sso_role_name: String,
    pub sso_region: String,
    pub region: String,
}

impl ProfileRecord {
    pub fn from_session(session: &CachedCredential, role: &AccountRole) -> Self {
        Self {
            name: role.profile_name(),
            sso_start_url: session.start_url.clone(),
            sso_account_id: role.account_id.clone(),
            sso_role_name: role.role_name.clone(),
            sso_region: session.region.clone(),
            region: session.region.clone(),
        }
    }

    /// Config section header this record owns
    pub fn section_name(&self) -> String {
        format!("profile {}", self.name)
    }

    /// The managed keys, in the order they are written
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("sso_start_url", self.sso_start_url.as_str()),
            ("sso_account_id", self.sso_account_id.as_str()),
            ("sso_role_name", self.sso_role_name.as_str()),
            ("sso_region", self.sso_region.as_str()),
            ("region", self.region.as_str()),
        ]
    }
}

/// Map enumerated roles to profile records, preserving enumeration order.
pub fn build_profiles(session: &CachedCredential, roles: &[AccountRole]) -> Vec<ProfileRecord> {
    roles
        .iter()
        .map(|role| ProfileRecord::from_session(session, role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session() -> CachedCredential {
        CachedCredential {
            start_url: "https://example.awsapps.com/start".to_string(),
            region: "eu-west-1".to_string(),
            access_token: "tok".to_string(),
            expires_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_derive_profile_name_happy_case() {
        assert_eq!(
            derive_profile_name("app-account", "admin-profile"),
            "app-account-admin-profile"
        );
    }

    #[test]
    fn test_derive_profile_name_lowercases() {
        assert_eq!(
            derive_profile_name("App-Account", "aDmin-profile"),
            "app-account-admin-profile"
        );
    }

    #[test]
    fn test_derive_profile_name_replaces_chars() {
        assert_eq!(
            derive_profile_name("app account.2", " admin-profile"),
            "app-account-2-admin-profile"
        );
    }

    #[test]
    fn test_cached_credential_decodes_cli_cache() {
        let json = r#"{
            "startUrl": "https://example.awsapps.com/start",
            "region": "us-east-1",
            "accessToken": "secret",
            "expiresAt": "2024-03-01T12:00:00Z",
            "clientId": "ignored",
            "refreshToken": "ignored"
        }"#;
        let cred: CachedCredential = serde_json::from_str(json).unwrap();
        assert_eq!(cred.start_url, "https://example.awsapps.com/start");
        assert_eq!(cred.region, "us-east-1");
        assert!(cred.is_usable());
        assert_eq!(
            cred.expires_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_cached_credential_legacy_utc_suffix() {
        let json = r#"{"accessToken": "x", "expiresAt": "2024-03-01T12:00:00UTC"}"#;
        let cred: CachedCredential = serde_json::from_str(json).unwrap();
        assert_eq!(
            cred.expires_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_cached_credential_missing_fields() {
        let cred: CachedCredential = serde_json::from_str(r#"{"clientId": "abc"}"#).unwrap();
        assert!(!cred.is_usable());
        assert_eq!(cred.expires_at, None);
        assert_eq!(cred.expiration_display(), "no expiry");
    }

    #[test]
    fn test_cached_credential_rejects_garbage_expiry() {
        let result: std::result::Result<CachedCredential, _> =
            serde_json::from_str(r#"{"accessToken": "x", "expiresAt": "tomorrow"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_record_from_session() {
        let role = AccountRole {
            account_id: "123456789012".to_string(),
            account_name: "Production".to_string(),
            role_name: "Developer".to_string(),
        };
        let record = ProfileRecord::from_session(&session(), &role);
        assert_eq!(record.name, "production-developer");
        assert_eq!(record.section_name(), "profile production-developer");
        assert_eq!(
            record.entries(),
            [
                ("sso_start_url", "https://example.awsapps.com/start"),
                ("sso_account_id", "123456789012"),
                ("sso_role_name", "Developer"),
                ("sso_region", "eu-west-1"),
                ("region", "eu-west-1"),
            ]
        );
        assert_eq!(role.display_name(), "Production/Developer");
    }

    #[test]
    fn test_build_profiles_keeps_order() {
        let roles = vec![
            AccountRole {
                account_id: "1".to_string(),
                account_name: "b".to_string(),
                role_name: "r".to_string(),
            },
            AccountRole {
                account_id: "2".to_string(),
                account_name: "a".to_string(),
                role_name: "r".to_string(),
            },
        ];
        let names: Vec<String> = build_profiles(&session(), &roles)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["b-r", "a-r"]);
    }
}
