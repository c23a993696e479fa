use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::info;

use super::api::{AuthApi, AuthProviderInfo, AuthProviders, CoreApi, SuperAdmin};
use crate::error::{OnboardError, Result};

const BUILTIN_PROVIDER: &str = "flecsport";

#[derive(Debug, Default)]
struct DeviceState {
    providers: BTreeMap<String, AuthProviderInfo>,
    core: Option<String>,
    super_admin: Option<String>,
    setup_requested: bool,
    /// Provider listings left before the built-in provider shows up
    pending_polls: u32,
    provider_delay: u32,
    unreachable: bool,
    provider_calls: u32,
}

/// Simulated device that keeps everything in memory
#[derive(Debug, Default)]
pub struct DryrunDevice {
    state: Mutex<DeviceState>,
}

impl DryrunDevice {
    /// A factory-fresh device: no providers, no core, no admin
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that already went through onboarding
    pub fn onboarded() -> Self {
        let device = Self::new().with_provider(BUILTIN_PROVIDER, "FLECS Port");
        {
            let mut state = device.lock();
            state.core = Some(BUILTIN_PROVIDER.to_string());
            state.super_admin = Some("admin".to_string());
        }
        device
    }

    pub fn with_provider(self, id: &str, name: &str) -> Self {
        self.lock().providers.insert(
            id.to_string(),
            AuthProviderInfo {
                name: Some(name.to_string()),
            },
        );
        self
    }

    /// Number of listings after first-time setup before the provider appears
    pub fn with_provider_delay(self, polls: u32) -> Self {
        self.lock().provider_delay = polls;
        self
    }

    /// Make every call fail as if the device could not be reached
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    pub fn core(&self) -> Option<String> {
        self.lock().core.clone()
    }

    pub fn admin_name(&self) -> Option<String> {
        self.lock().super_admin.clone()
    }

    pub fn setup_requested(&self) -> bool {
        self.lock().setup_requested
    }

    pub fn provider_calls(&self) -> u32 {
        self.lock().provider_calls
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reachable(&self) -> Result<MutexGuard<'_, DeviceState>> {
        let state = self.lock();
        if state.unreachable {
            return Err(OnboardError::Api {
                status: 503,
                message: "device unreachable".to_string(),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl CoreApi for DryrunDevice {
    async fn auth_providers(&self) -> Result<AuthProviders> {
        let mut state = self.reachable()?;
        state.provider_calls += 1;

        if state.setup_requested && !state.providers.contains_key(BUILTIN_PROVIDER) {
            if state.pending_polls == 0 {
                info!("Dryrun: built-in auth provider is now available");
                state.providers.insert(
                    BUILTIN_PROVIDER.to_string(),
                    AuthProviderInfo {
                        name: Some("FLECS Port".to_string()),
                    },
                );
            } else {
                state.pending_polls -= 1;
            }
        }

        Ok(AuthProviders {
            core: state.core.clone(),
            providers: state.providers.clone(),
        })
    }

    async fn core_provider(&self) -> Result<Option<String>> {
        Ok(self.reachable()?.core.clone())
    }

    async fn set_core_provider(&self, provider: &str) -> Result<()> {
        let mut state = self.reachable()?;
        if !state.providers.contains_key(provider) {
            return Err(OnboardError::Api {
                status: 404,
                message: format!("unknown provider '{provider}'"),
            });
        }
        info!("Dryrun: core auth provider set to {}", provider);
        state.core = Some(provider.to_string());
        Ok(())
    }

    async fn first_time_setup(&self) -> Result<()> {
        let mut state = self.reachable()?;
        info!("Dryrun: first-time setup requested");
        state.setup_requested = true;
        state.pending_polls = state.provider_delay;
        Ok(())
    }
}

#[async_trait]
impl AuthApi for DryrunDevice {
    async fn super_admin_exists(&self) -> Result<bool> {
        Ok(self.reachable()?.super_admin.is_some())
    }

    async fn create_super_admin(&self, admin: &SuperAdmin) -> Result<()> {
        let mut state = self.reachable()?;
        if state.core.is_none() {
            return Err(OnboardError::Api {
                status: 409,
                message: "no core auth provider configured".to_string(),
            });
        }
        if state.super_admin.is_some() {
            return Err(OnboardError::Api {
                status: 409,
                message: "super admin already exists".to_string(),
            });
        }
        info!("Dryrun: created super admin '{}'", admin.name);
        state.super_admin = Some(admin.name.clone());
        Ok(())
    }
}
