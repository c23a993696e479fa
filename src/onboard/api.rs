use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;

/// An authentication provider known to the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviderInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// Providers reported by the device plus the one configured as core
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviders {
    #[serde(default)]
    pub core: Option<String>,
    #[serde(default)]
    pub providers: BTreeMap<String, AuthProviderInfo>,
}

impl AuthProviders {
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Display name of a provider, falling back to its id
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.providers
            .get(id)
            .and_then(|p| p.name.as_deref())
            .unwrap_or(id)
    }
}

/// Initial administrator account
#[derive(Clone, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct SuperAdmin {
    pub name: String,
    pub full_name: String,
    pub password: String,
}

impl std::fmt::Debug for SuperAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperAdmin")
            .field("name", &self.name)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Device core API used during onboarding (no authentication required)
#[async_trait]
pub trait CoreApi: Send + Sync {
    async fn auth_providers(&self) -> Result<AuthProviders>;

    /// Id of the core auth provider, `None` if none is configured
    async fn core_provider(&self) -> Result<Option<String>>;

    async fn set_core_provider(&self, provider: &str) -> Result<()>;

    /// Install the built-in provider on a device that has none
    async fn first_time_setup(&self) -> Result<()>;
}

/// API of the configured auth provider
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn super_admin_exists(&self) -> Result<bool>;

    async fn create_super_admin(&self, admin: &SuperAdmin) -> Result<()>;
}

/// Handles passed to every onboarding step check
#[derive(Clone, Default)]
pub struct OnboardContext {
    pub core: Option<Arc<dyn CoreApi>>,
    pub auth: Option<Arc<dyn AuthApi>>,
}

impl OnboardContext {
    pub fn new(core: Arc<dyn CoreApi>, auth: Arc<dyn AuthApi>) -> Self {
        Self {
            core: Some(core),
            auth: Some(auth),
        }
    }

    /// Context backed by one value implementing both APIs
    pub fn from_device<D>(device: Arc<D>) -> Self
    where
        D: CoreApi + AuthApi + 'static,
    {
        Self {
            core: Some(device.clone()),
            auth: Some(device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_providers_parse_device_payload() {
        let json = r#"{
            "core": null,
            "providers": {
                "flecsport": { "name": "FLECS Port" },
                "ldap": {}
            }
        }"#;
        let providers: AuthProviders = serde_json::from_str(json).unwrap();

        assert!(providers.core.is_none());
        assert_eq!(providers.provider_ids(), vec!["flecsport", "ldap"]);
        assert_eq!(providers.display_name("flecsport"), "FLECS Port");
        assert_eq!(providers.display_name("ldap"), "ldap");
    }

    #[test]
    fn test_empty_payload_parses() {
        let providers: AuthProviders = serde_json::from_str("{}").unwrap();
        assert_eq!(providers, AuthProviders::default());
    }

    #[test]
    fn test_super_admin_debug_hides_password() {
        let admin = SuperAdmin {
            name: "admin".to_string(),
            full_name: "admin".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{admin:?}").contains("hunter22"));
    }
}
