use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::step::WizardStep;
use crate::error::{OnboardError, Result};

/// Shared counter of `is_completed` calls
#[derive(Clone, Default)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to flip a mock step's completion from the outside
#[derive(Clone, Default)]
pub struct CompletionSwitch {
    done: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
}

impl CompletionSwitch {
    pub fn set(&self, done: bool) {
        self.done.store(done, Ordering::SeqCst);
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

pub struct MockStep {
    id: String,
    title: String,
    deps: Vec<String>,
    skippable: bool,
    executable: bool,
    gate_fails: bool,
    switch: CompletionSwitch,
    calls: CallCount,
}

impl MockStep {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: id.to_string(),
            deps: Vec::new(),
            skippable: false,
            executable: true,
            gate_fails: false,
            switch: CompletionSwitch::default(),
            calls: CallCount::default(),
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.deps = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn completed(self, done: bool) -> Self {
        self.switch.set(done);
        self
    }

    pub fn failing(self) -> Self {
        self.switch.fail(true);
        self
    }

    pub fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    pub fn executable(mut self, executable: bool) -> Self {
        self.executable = executable;
        self
    }

    pub fn failing_gate(mut self) -> Self {
        self.gate_fails = true;
        self
    }

    pub fn switch(&self) -> CompletionSwitch {
        self.switch.clone()
    }

    pub fn calls(&self) -> CallCount {
        self.calls.clone()
    }

    pub fn into_arc<C: Send + Sync>(self) -> Arc<dyn WizardStep<C>> {
        Arc::new(self)
    }
}

#[async_trait]
impl<C: Send + Sync> WizardStep<C> for MockStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        "mock step"
    }

    async fn is_completed(&self, _ctx: &C) -> Result<bool> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        if self.switch.failing.load(Ordering::SeqCst) {
            return Err(OnboardError::step(&self.id, "status check failed"));
        }
        Ok(self.switch.done.load(Ordering::SeqCst))
    }

    async fn can_execute(&self, _ctx: &C) -> Result<bool> {
        if self.gate_fails {
            return Err(OnboardError::step(&self.id, "precondition check failed"));
        }
        Ok(self.executable)
    }

    fn can_skip(&self) -> bool {
        self.skippable
    }

    fn dependencies(&self) -> Vec<String> {
        self.deps.clone()
    }
}
