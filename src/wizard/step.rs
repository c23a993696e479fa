use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of running a step's side-effecting action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl StepResult {
    pub fn success(data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            error: None,
            data,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }
}

/// One stage of a multi-step setup flow.
///
/// Completion is never stored on the step. It is derived on demand from the
/// context `C`, which the wizard passes through unchanged.
#[async_trait]
pub trait WizardStep<C>: Send + Sync
where
    C: Send + Sync,
{
    /// Unique registry key
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    fn description(&self) -> &str;

    /// Whether this step is already done.
    ///
    /// An `Err` means "unknown" and must be reported, never read as `false`.
    async fn is_completed(&self, ctx: &C) -> Result<bool>;

    /// Extra gating on top of dependency satisfaction
    async fn can_execute(&self, _ctx: &C) -> Result<bool> {
        Ok(true)
    }

    /// Skippable steps count as passed when checking overall completion
    fn can_skip(&self) -> bool {
        false
    }

    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn execute(&self, _ctx: &C) -> StepResult {
        StepResult::failure("Not implemented")
    }
}

/// One-shot marker for side effects that must run exactly once per step
/// instance, no matter how many times the step is rendered.
#[derive(Debug, Default)]
pub struct OnceLatch {
    fired: AtomicBool,
}

impl OnceLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for the first caller only
    pub fn fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Re-arm the latch when the owning wizard run is torn down
    pub fn reset(&self) {
        self.fired.store(false, Ordering::Release);
    }
}
