//! Generic multi-step wizard engine: steps, the registry that gates them on
//! their dependencies, and the provider that runs the state machine.

mod provider;
mod registry;
mod step;

#[cfg(test)]
pub(crate) mod testing;

pub use provider::{WizardProvider, WizardState};
pub use registry::WizardStepRegistry;
pub use step::{OnceLatch, StepResult, WizardStep};
