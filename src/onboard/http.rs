use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};

use super::api::{AuthApi, AuthProviders, CoreApi, SuperAdmin};
use super::config::ApiConfig;
use crate::error::{OnboardError, Result};

#[derive(Debug, Serialize)]
struct SetCoreProviderRequest<'a> {
    provider: &'a str,
}

/// Talks to a real device over its REST API
#[derive(Debug, Clone)]
pub struct HttpDeviceApi {
    client: Client,
    base_url: String,
    auth_url: String,
}

impl HttpDeviceApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url(),
        })
    }

    fn core_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_provider_url(&self, path: &str) -> String {
        format!("{}{}", self.auth_url, path)
    }

    async fn api_error(response: Response) -> OnboardError {
        let status = response.status();
        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        OnboardError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull the provider id out of whatever shape the core endpoint returned
fn core_provider_id(body: serde_json::Value) -> Option<String> {
    match body {
        serde_json::Value::String(id) if !id.is_empty() => Some(id),
        serde_json::Value::Object(map) => map
            .get("provider")
            .or_else(|| map.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}

#[async_trait]
impl CoreApi for HttpDeviceApi {
    #[instrument(skip(self))]
    async fn auth_providers(&self) -> Result<AuthProviders> {
        let response = self.client.get(self.core_url("/providers/auth")).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            _ => Err(Self::api_error(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn core_provider(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.core_url("/providers/auth/core"))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: serde_json::Value = response.json().await?;
                Ok(core_provider_id(body))
            }
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            _ => Err(Self::api_error(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn set_core_provider(&self, provider: &str) -> Result<()> {
        debug!("Setting core auth provider to {}", provider);
        let response = self
            .client
            .put(self.core_url("/providers/auth/core"))
            .json(&SetCoreProviderRequest { provider })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    #[instrument(skip(self))]
    async fn first_time_setup(&self) -> Result<()> {
        let response = self
            .client
            .post(self.core_url("/providers/auth/first-time-setup/flecsport"))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }
}

#[async_trait]
impl AuthApi for HttpDeviceApi {
    #[instrument(skip(self))]
    async fn super_admin_exists(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.auth_provider_url("/super-admin"))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(false),
            _ => Err(Self::api_error(response).await),
        }
    }

    #[instrument(skip(self, admin), fields(name = %admin.name))]
    async fn create_super_admin(&self, admin: &SuperAdmin) -> Result<()> {
        let response = self
            .client
            .post(self.auth_provider_url("/super-admin"))
            .json(admin)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls_are_joined_without_double_slash() {
        let api = HttpDeviceApi::new(&ApiConfig {
            base_url: "http://device/api/v2/".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();

        assert_eq!(api.core_url("/providers/auth"), "http://device/api/v2/providers/auth");
        assert_eq!(
            api.auth_provider_url("/super-admin"),
            "http://device/api/v2/providers/auth/core/super-admin"
        );
    }

    #[test]
    fn test_core_provider_id_shapes() {
        assert_eq!(core_provider_id(json!("flecsport")), Some("flecsport".to_string()));
        assert_eq!(
            core_provider_id(json!({ "provider": "ldap" })),
            Some("ldap".to_string())
        );
        assert_eq!(core_provider_id(json!({ "id": "x" })), Some("x".to_string()));
        assert_eq!(core_provider_id(json!("")), None);
        assert_eq!(core_provider_id(json!(null)), None);
    }
}
