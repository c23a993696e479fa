//! Per-step views. The wizard looks a panel up by the id of its current step.

mod auth_provider;
mod completion;
mod super_admin;

use std::collections::HashMap;

use crossterm::event::KeyEvent;
use ratatui::prelude::*;

pub use auth_provider::AuthProviderPanel;
pub use completion::CompletionPanel;
pub use super_admin::SuperAdminPanel;

use super::Theme;
use super::widgets::StatusBarState;
use crate::onboard::steps::{AUTH_PROVIDER, AuthSetupOutcome, COMPLETION, SUPER_ADMIN};
use crate::onboard::{OnboardContext, OnboardingSteps, SuperAdmin};
use crate::vim::VimMode;
use crate::wizard::WizardState;

/// Wizard state handed to the current panel on every call
#[derive(Debug, Clone, Copy)]
pub struct StepProps<'a> {
    pub is_loading: bool,
    pub error: Option<&'a str>,
    pub mode: VimMode,
}

impl<'a> StepProps<'a> {
    pub fn new<C: Send + Sync>(state: &'a WizardState<C>, mode: VimMode) -> Self {
        Self {
            is_loading: state.is_loading,
            error: state.error.as_deref(),
            mode,
        }
    }
}

/// What a panel asks the wizard to do
#[derive(Debug)]
pub enum StepEvent {
    Next,
    Previous,
    /// Mark the current step done and move on
    Complete,
    /// Complete, then leave the wizard for the device login
    Finish,
    /// Run a device operation in the background
    Run(StepTask),
}

#[derive(Debug)]
pub enum StepTask {
    AuthSetup,
    SelectProvider(String),
    CreateAdmin(SuperAdmin),
}

/// Result of a [`StepTask`], routed back to the panel that asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    AuthSetup(Result<AuthSetupOutcome, String>),
    ProviderSelected(Result<String, String>),
    AdminCreated(Result<String, String>),
}

impl TaskOutcome {
    pub fn step_id(&self) -> &'static str {
        match self {
            TaskOutcome::AuthSetup(_) | TaskOutcome::ProviderSelected(_) => AUTH_PROVIDER,
            TaskOutcome::AdminCreated(_) => SUPER_ADMIN,
        }
    }
}

pub async fn run_task(task: StepTask, steps: &OnboardingSteps, ctx: &OnboardContext) -> TaskOutcome {
    match task {
        StepTask::AuthSetup => {
            let result = match &ctx.core {
                Some(core) => steps
                    .auth_provider
                    .run_setup(core.as_ref())
                    .await
                    .map_err(|e| e.to_string()),
                None => Err("Device API unavailable".to_string()),
            };
            TaskOutcome::AuthSetup(result)
        }
        StepTask::SelectProvider(id) => {
            let result = match &ctx.core {
                Some(core) => steps
                    .auth_provider
                    .select_provider(core.as_ref(), &id)
                    .await
                    .map(|()| id)
                    .map_err(|e| e.to_string()),
                None => Err("Device API unavailable".to_string()),
            };
            TaskOutcome::ProviderSelected(result)
        }
        StepTask::CreateAdmin(admin) => {
            let result = steps
                .super_admin
                .create(ctx, &admin)
                .await
                .map(|()| admin.name.clone())
                .map_err(|e| e.to_string());
            TaskOutcome::AdminCreated(result)
        }
    }
}

/// View and key handling for one wizard step
pub trait StepPanel {
    fn draw(&self, frame: &mut Frame, area: Rect, props: &StepProps, theme: &Theme);

    fn handle_key(&mut self, key: KeyEvent, props: &StepProps) -> Option<StepEvent>;

    /// Called before every frame while this panel's step is current
    fn on_render(&mut self, _props: &StepProps) -> Option<StepEvent> {
        None
    }

    fn on_task(&mut self, _outcome: TaskOutcome) -> Option<StepEvent> {
        None
    }

    /// Whether `i` should switch to insert mode
    fn accepts_input(&self) -> bool {
        false
    }

    fn status(&self, props: &StepProps) -> StatusBarState;
}

pub fn onboarding_panels(steps: &OnboardingSteps) -> HashMap<String, Box<dyn StepPanel>> {
    let mut panels: HashMap<String, Box<dyn StepPanel>> = HashMap::new();
    panels.insert(AUTH_PROVIDER.to_string(), Box::new(AuthProviderPanel::new()));
    panels.insert(
        SUPER_ADMIN.to_string(),
        Box::new(SuperAdminPanel::new(steps.super_admin.default_username())),
    );
    panels.insert(
        COMPLETION.to_string(),
        Box::new(CompletionPanel::new(steps.completion.clone())),
    );
    panels
}

/// Write `text` on one line of `area` at row offset `dy`, if it fits
pub(crate) fn line_at(frame: &mut Frame, area: Rect, dy: u16, text: Line) {
    if dy >= area.height {
        return;
    }
    frame.render_widget(
        ratatui::widgets::Paragraph::new(text),
        Rect::new(area.x, area.y + dy, area.width, 1),
    );
}
