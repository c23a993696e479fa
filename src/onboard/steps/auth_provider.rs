use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::AUTH_PROVIDER;
use crate::error::{OnboardError, Result};
use crate::onboard::api::{AuthProviders, CoreApi, OnboardContext};
use crate::onboard::config::PollingConfig;
use crate::onboard::status::{check_auth_provider_configured, check_auth_provider_core_configured};
use crate::wizard::{StepResult, WizardStep};

/// What the automated provider setup ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSetupOutcome {
    /// A core provider was configured before we started
    AlreadyConfigured,
    /// We configured this provider as core
    Configured(String),
    /// Several providers exist; the user has to pick one
    SelectionRequired(AuthProviders),
}

pub struct AuthProviderStep {
    polling: PollingConfig,
}

impl AuthProviderStep {
    pub fn new(polling: PollingConfig) -> Self {
        Self { polling }
    }

    /// Configure a core provider without user input where possible.
    ///
    /// A single provider is taken as is. With none, first-time setup is
    /// triggered and the device is polled until a provider shows up.
    pub async fn run_setup(&self, core: &dyn CoreApi) -> Result<AuthSetupOutcome> {
        if check_auth_provider_core_configured(core).await {
            info!("Auth provider already configured");
            return Ok(AuthSetupOutcome::AlreadyConfigured);
        }

        let providers = core.auth_providers().await?;
        let ids = providers.provider_ids();

        match ids.as_slice() {
            [] => {
                info!("No auth providers found, running first-time setup");
                core.first_time_setup().await?;
                self.poll_for_providers(core).await
            }
            [only] => {
                self.select_provider(core, only).await?;
                Ok(AuthSetupOutcome::Configured(only.clone()))
            }
            _ => Ok(AuthSetupOutcome::SelectionRequired(providers)),
        }
    }

    pub async fn select_provider(&self, core: &dyn CoreApi, provider: &str) -> Result<()> {
        if provider.is_empty() {
            return Err(OnboardError::step(AUTH_PROVIDER, "Please select a provider"));
        }
        info!("Configuring core auth provider '{}'", provider);
        core.set_core_provider(provider).await
    }

    async fn poll_for_providers(&self, core: &dyn CoreApi) -> Result<AuthSetupOutcome> {
        for attempt in 1..=self.polling.max_attempts {
            tokio::time::sleep(self.polling.interval()).await;

            let providers = match core.auth_providers().await {
                Ok(providers) => providers,
                Err(e) => {
                    debug!("Provider poll {} failed: {}", attempt, e);
                    continue;
                }
            };

            if let Some(configured) = providers.core {
                return Ok(AuthSetupOutcome::Configured(configured));
            }

            if let Some(first) = providers.provider_ids().into_iter().next() {
                match self.select_provider(core, &first).await {
                    Ok(()) => return Ok(AuthSetupOutcome::Configured(first)),
                    Err(e) => debug!("Configuring '{}' failed on poll {}: {}", first, attempt, e),
                }
            }
        }

        Err(OnboardError::Timeout(
            "Timeout waiting for authentication providers to become available after first-time setup"
                .to_string(),
        ))
    }
}

#[async_trait]
impl WizardStep<OnboardContext> for AuthProviderStep {
    fn id(&self) -> &str {
        AUTH_PROVIDER
    }

    fn title(&self) -> &str {
        "Setup Authentication Provider"
    }

    fn description(&self) -> &str {
        "Configure the default authentication provider for your device"
    }

    async fn is_completed(&self, ctx: &OnboardContext) -> Result<bool> {
        let Some(core) = &ctx.core else {
            return Ok(false);
        };
        Ok(check_auth_provider_configured(core.as_ref()).await)
    }

    async fn execute(&self, ctx: &OnboardContext) -> StepResult {
        let Some(core) = &ctx.core else {
            return StepResult::failure("Device API unavailable");
        };

        match self.run_setup(core.as_ref()).await {
            Ok(AuthSetupOutcome::AlreadyConfigured) => StepResult::success(None),
            Ok(AuthSetupOutcome::Configured(provider)) => {
                StepResult::success(Some(json!({ "provider": provider })))
            }
            Ok(AuthSetupOutcome::SelectionRequired(providers)) => StepResult {
                success: false,
                error: Some("Multiple authentication providers available".to_string()),
                data: Some(json!({ "providers": providers.provider_ids() })),
            },
            Err(e) => StepResult::failure(e.to_string()),
        }
    }
}
