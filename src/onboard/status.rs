use tracing::{info, warn};

use super::api::{AuthApi, CoreApi, OnboardContext};

/// Whether the device reports a core auth provider in its provider listing.
/// API failures count as "not configured".
pub async fn check_auth_provider_configured(api: &dyn CoreApi) -> bool {
    match api.auth_providers().await {
        Ok(providers) => providers.core.is_some(),
        Err(e) => {
            warn!("Failed to query auth providers: {}", e);
            false
        }
    }
}

/// Same question asked of the dedicated core endpoint
pub async fn check_auth_provider_core_configured(api: &dyn CoreApi) -> bool {
    match api.core_provider().await {
        Ok(core) => core.is_some(),
        Err(e) => {
            warn!("Failed to query core auth provider: {}", e);
            false
        }
    }
}

pub async fn check_super_admin_exists(api: &dyn AuthApi) -> bool {
    match api.super_admin_exists().await {
        Ok(exists) => exists,
        Err(e) => {
            warn!("Failed to query super admin: {}", e);
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingStatus {
    pub auth_provider_configured: bool,
    pub super_admin_exists: bool,
}

impl OnboardingStatus {
    pub fn is_required(&self) -> bool {
        !self.auth_provider_configured || !self.super_admin_exists
    }
}

/// Decide whether the device still has to be onboarded
pub async fn onboarding_status(ctx: &OnboardContext) -> OnboardingStatus {
    let auth_provider_configured = match &ctx.core {
        Some(core) => check_auth_provider_configured(core.as_ref()).await,
        None => false,
    };
    let super_admin_exists = match &ctx.auth {
        Some(auth) => check_super_admin_exists(auth.as_ref()).await,
        None => false,
    };

    let status = OnboardingStatus {
        auth_provider_configured,
        super_admin_exists,
    };
    info!("Onboarding required: {}", status.is_required());
    status
}
