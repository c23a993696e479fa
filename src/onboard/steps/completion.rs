use async_trait::async_trait;
use tracing::info;

use super::{AUTH_PROVIDER, COMPLETION};
use crate::error::Result;
use crate::onboard::api::OnboardContext;
use crate::wizard::{OnceLatch, StepResult, WizardStep};

/// Final step. Done once its hand-off to the device login has run.
#[derive(Debug, Default)]
pub struct CompletionStep {
    latch: OnceLatch,
}

impl CompletionStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the hand-off. Returns `true` for the first caller of this run.
    pub fn fire(&self) -> bool {
        let first = self.latch.fire();
        if first {
            info!("Onboarding finished, handing off to device login");
        }
        first
    }

    pub fn has_fired(&self) -> bool {
        self.latch.has_fired()
    }

    /// Re-arm for a fresh wizard run
    pub fn reset(&self) {
        self.latch.reset();
    }
}

#[async_trait]
impl WizardStep<OnboardContext> for CompletionStep {
    fn id(&self) -> &str {
        COMPLETION
    }

    fn title(&self) -> &str {
        "Complete"
    }

    fn description(&self) -> &str {
        "Onboarding completed successfully"
    }

    async fn is_completed(&self, _ctx: &OnboardContext) -> Result<bool> {
        Ok(self.latch.has_fired())
    }

    fn dependencies(&self) -> Vec<String> {
        vec![AUTH_PROVIDER.to_string()]
    }

    async fn execute(&self, _ctx: &OnboardContext) -> StepResult {
        self.fire();
        StepResult::success(None)
    }
}
