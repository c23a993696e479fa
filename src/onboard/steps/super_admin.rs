use async_trait::async_trait;
use tracing::info;

use super::{AUTH_PROVIDER, SUPER_ADMIN};
use crate::error::{OnboardError, Result};
use crate::onboard::api::{OnboardContext, SuperAdmin};
use crate::onboard::status::check_super_admin_exists;
use crate::wizard::WizardStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0 to 125, in steps of 25
    pub score: u8,
    pub label: &'static str,
}

pub fn password_strength(password: &str) -> PasswordStrength {
    let len = password.chars().count();
    let checks = [
        len >= 8,
        len >= 12,
        password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = checks.iter().filter(|&&passed| passed).count() as u8 * 25;

    let label = match score {
        0..=25 => "Weak",
        26..=50 => "Fair",
        51..=75 => "Good",
        _ => "Strong",
    };
    PasswordStrength { score, label }
}

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.confirm.is_none()
    }
}

/// Validate the account form and build the request on success
pub fn validate_form(
    username: &str,
    password: &str,
    confirm: &str,
) -> std::result::Result<SuperAdmin, FormErrors> {
    let mut errors = FormErrors::default();

    if username.trim().is_empty() {
        errors.username = Some("Username is required".to_string());
    }
    if password.is_empty() {
        errors.password = Some("Password is required".to_string());
    }
    if password != confirm {
        errors.confirm = Some("Passwords do not match".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let name = username.trim().to_string();
    Ok(SuperAdmin {
        full_name: name.clone(),
        name,
        password: password.to_string(),
    })
}

pub struct SuperAdminStep {
    default_username: String,
}

impl SuperAdminStep {
    pub fn new(default_username: impl Into<String>) -> Self {
        Self {
            default_username: default_username.into(),
        }
    }

    pub fn default_username(&self) -> &str {
        &self.default_username
    }

    pub async fn create(&self, ctx: &OnboardContext, admin: &SuperAdmin) -> Result<()> {
        let auth = ctx
            .auth
            .as_ref()
            .ok_or_else(|| OnboardError::step(SUPER_ADMIN, "Auth provider API unavailable"))?;

        info!("Creating super admin '{}'", admin.name);
        auth.create_super_admin(admin).await
    }
}

#[async_trait]
impl WizardStep<OnboardContext> for SuperAdminStep {
    fn id(&self) -> &str {
        SUPER_ADMIN
    }

    fn title(&self) -> &str {
        "Create Super Admin"
    }

    fn description(&self) -> &str {
        "Create the initial administrator account"
    }

    async fn is_completed(&self, ctx: &OnboardContext) -> Result<bool> {
        let Some(auth) = &ctx.auth else {
            return Ok(false);
        };
        Ok(check_super_admin_exists(auth.as_ref()).await)
    }

    fn dependencies(&self) -> Vec<String> {
        vec![AUTH_PROVIDER.to_string()]
    }
}
