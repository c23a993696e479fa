mod auth_provider;
mod completion;
mod super_admin;

pub use auth_provider::{AuthProviderStep, AuthSetupOutcome};
pub use completion::CompletionStep;
pub use super_admin::{
    FormErrors, PasswordStrength, SuperAdminStep, password_strength, validate_form,
};

pub const AUTH_PROVIDER: &str = "auth-provider";
pub const SUPER_ADMIN: &str = "super-admin";
pub const COMPLETION: &str = "completion";

/// Compact label for the stepper, falling back to the step title
pub fn short_name<'a>(id: &str, title: &'a str) -> &'a str {
    match id {
        AUTH_PROVIDER => "Auth",
        SUPER_ADMIN => "Admin",
        COMPLETION => "Done",
        _ => title,
    }
}
