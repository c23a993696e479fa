//! Device onboarding: the device API, its simulated stand-in, and the three
//! concrete wizard steps that take a fresh device to a usable state.

pub mod api;
pub mod config;
pub mod dryrun;
pub mod http;
pub mod status;
pub mod steps;

use std::sync::Arc;

pub use api::{AuthApi, AuthProviders, CoreApi, OnboardContext, SuperAdmin};
pub use config::OnboardConfig;
pub use dryrun::DryrunDevice;
pub use http::HttpDeviceApi;
pub use status::{OnboardingStatus, onboarding_status};
pub use steps::{AuthProviderStep, CompletionStep, SuperAdminStep};

use crate::error::Result;
use crate::wizard::WizardStepRegistry;

/// The concrete step instances of one onboarding run.
///
/// The UI needs the typed handles for step-specific actions; the registry
/// only sees them as trait objects.
#[derive(Clone)]
pub struct OnboardingSteps {
    pub auth_provider: Arc<AuthProviderStep>,
    pub super_admin: Arc<SuperAdminStep>,
    pub completion: Arc<CompletionStep>,
}

impl OnboardingSteps {
    pub fn new(config: &OnboardConfig) -> Self {
        Self {
            auth_provider: Arc::new(AuthProviderStep::new(config.polling.clone())),
            super_admin: Arc::new(SuperAdminStep::new(
                config.super_admin.default_username.clone(),
            )),
            completion: Arc::new(CompletionStep::new()),
        }
    }

    pub fn registry(&self) -> WizardStepRegistry<OnboardContext> {
        let mut registry = WizardStepRegistry::new();
        registry.register(self.auth_provider.clone(), None);
        registry.register(self.super_admin.clone(), None);
        registry.register(self.completion.clone(), None);
        registry
    }
}

/// Build the device context from config: a simulated device in dryrun mode,
/// the REST API otherwise
pub fn connect(config: &OnboardConfig) -> Result<OnboardContext> {
    if config.general.dryrun {
        tracing::info!("Dryrun mode, using simulated device");
        return Ok(OnboardContext::from_device(Arc::new(
            DryrunDevice::new().with_provider_delay(3),
        )));
    }

    let device = HttpDeviceApi::new(&config.api)?;
    tracing::info!("Using device API at {}", config.api.base_url);
    Ok(OnboardContext::from_device(Arc::new(device)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_dependencies() {
        let steps = OnboardingSteps::new(&OnboardConfig::default());
        let registry = steps.registry();

        let ids: Vec<String> = registry
            .all_steps()
            .iter()
            .map(|step| step.id().to_string())
            .collect();
        assert_eq!(ids, vec!["auth-provider", "super-admin", "completion"]);

        let super_admin = registry.get_step("super-admin").unwrap();
        assert_eq!(super_admin.dependencies(), vec!["auth-provider"]);
        assert_eq!(super_admin.title(), "Create Super Admin");
    }

    #[tokio::test]
    async fn test_registry_shares_step_instances() {
        let steps = OnboardingSteps::new(&OnboardConfig::default());
        let registry = steps.registry();
        let completion = registry.get_step("completion").unwrap();
        let ctx = OnboardContext::default();

        assert!(!completion.is_completed(&ctx).await.unwrap());
        steps.completion.fire();
        assert!(completion.is_completed(&ctx).await.unwrap());
    }

    #[test]
    fn test_connect_dryrun() {
        let mut config = OnboardConfig::default();
        config.general.dryrun = true;

        let ctx = connect(&config).unwrap();
        assert!(ctx.core.is_some());
        assert!(ctx.auth.is_some());
    }
}
