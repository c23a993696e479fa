use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::step::WizardStep;
use crate::error::Result;

/// Ordered catalog of steps plus the dependency-gating queries
pub struct WizardStepRegistry<C: Send + Sync> {
    steps: HashMap<String, Arc<dyn WizardStep<C>>>,
    order: Vec<String>,
}

impl<C: Send + Sync> Default for WizardStepRegistry<C> {
    fn default() -> Self {
        Self {
            steps: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<C: Send + Sync> WizardStepRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step, appending it or inserting it at `position`.
    ///
    /// The first registration of an id wins; later ones are ignored.
    pub fn register(&mut self, step: Arc<dyn WizardStep<C>>, position: Option<usize>) {
        let id = step.id().to_string();
        if self.steps.contains_key(&id) {
            debug!("Step '{}' already registered, ignoring", id);
            return;
        }

        match position {
            Some(pos) => {
                let pos = pos.min(self.order.len());
                self.order.insert(pos, id.clone());
            }
            None => self.order.push(id.clone()),
        }
        self.steps.insert(id, step);
    }

    pub fn unregister(&mut self, id: &str) {
        self.steps.remove(id);
        self.order.retain(|existing| existing != id);
    }

    pub fn get_step(&self, id: &str) -> Option<Arc<dyn WizardStep<C>>> {
        self.steps.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    /// Position of `id` in registration order
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|existing| existing == id)
    }

    /// All steps in registration order
    pub fn all_steps(&self) -> Vec<Arc<dyn WizardStep<C>>> {
        self.order
            .iter()
            .filter_map(|id| self.steps.get(id).cloned())
            .collect()
    }

    /// Steps not yet completed whose dependencies are all in `completed` and
    /// whose own `can_execute` check passes, in registration order.
    pub async fn available_steps(
        &self,
        completed: &[String],
        ctx: &C,
    ) -> Result<Vec<Arc<dyn WizardStep<C>>>> {
        let mut available = Vec::new();

        for step in self.all_steps() {
            if completed.iter().any(|id| id == step.id()) {
                continue;
            }

            let satisfied = step
                .dependencies()
                .iter()
                .all(|dep| completed.contains(dep));

            if satisfied && step.can_execute(ctx).await? {
                available.push(step);
            }
        }

        Ok(available)
    }

    pub async fn next_step(
        &self,
        completed: &[String],
        ctx: &C,
    ) -> Result<Option<Arc<dyn WizardStep<C>>>> {
        Ok(self.available_steps(completed, ctx).await?.into_iter().next())
    }

    /// True when every step is either skippable or reports completed.
    /// Stops at the first step that is neither.
    pub async fn is_wizard_completed(&self, ctx: &C) -> Result<bool> {
        for step in self.all_steps() {
            if step.can_skip() {
                continue;
            }
            if !step.is_completed(ctx).await? {
                debug!("Wizard incomplete at step '{}'", step.id());
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn step_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.order.clear();
    }
}
