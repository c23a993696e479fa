use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::event::{Event, EventSender};
use crate::onboard::{OnboardConfig, OnboardContext, OnboardingSteps};
use crate::ui::Theme;
use crate::ui::panels::{StepEvent, StepPanel, StepProps, TaskOutcome, onboarding_panels, run_task};
use crate::ui::widgets::{HorizontalStepper, Message, StatusBarState};
use crate::vim::{Command, InputBuffer, ModeAction, VimMode, parse_command};
use crate::wizard::{WizardProvider, WizardState};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// The onboarding wizard as seen by the terminal: a snapshot of the wizard
/// state, one panel per step and the vim-style input modes around them
pub struct OnboardApp {
    pub config: OnboardConfig,
    pub theme: Theme,
    /// Last published wizard state, refreshed on [`Event::Wizard`]
    pub wizard: WizardState<OnboardContext>,
    pub vim_mode: VimMode,
    pub command_buffer: InputBuffer,
    pub message: Option<Message>,
    pub status_bar: StatusBarState,
    pub show_help: bool,
    pub should_exit: bool,
    /// Onboarding finished and the device login should take over
    pub handoff: bool,
    provider: WizardProvider<OnboardContext>,
    steps: OnboardingSteps,
    panels: HashMap<String, Box<dyn StepPanel>>,
    events: EventSender,
    pending: Vec<JoinHandle<()>>,
    spinner_frame: usize,
}

impl OnboardApp {
    pub fn new(config: OnboardConfig, context: OnboardContext, events: EventSender) -> Self {
        let steps = OnboardingSteps::new(&config);
        let provider = WizardProvider::new(Arc::new(steps.registry()), Arc::new(context));
        let panels = onboarding_panels(&steps);

        info!("Initialized onboarding with {} steps", panels.len());

        Self {
            config,
            theme: Theme::default(),
            wizard: provider.state(),
            vim_mode: VimMode::Normal,
            command_buffer: InputBuffer::new(),
            message: None,
            status_bar: StatusBarState::loading(),
            show_help: false,
            should_exit: false,
            handoff: false,
            provider,
            steps,
            panels,
            events,
            pending: Vec::new(),
            spinner_frame: 0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardState<OnboardContext>> {
        self.provider.subscribe()
    }

    /// Kick off the first status check
    pub fn start(&mut self) {
        let provider = self.provider.clone();
        self.spawn(async move { provider.initialize().await });
    }

    pub fn is_dryrun(&self) -> bool {
        self.config.general.dryrun
    }

    /// Where the wizard talks to, for the header
    pub fn device_label(&self) -> &str {
        if self.is_dryrun() {
            "dryrun"
        } else {
            &self.config.api.base_url
        }
    }

    pub fn current_panel(&self) -> Option<&dyn StepPanel> {
        let id = self.wizard.current_step_id()?;
        self.panels.get(id).map(|panel| panel.as_ref())
    }

    pub fn spinner(&self) -> Option<char> {
        (self.wizard.is_loading || !self.pending.is_empty()).then(|| SPINNER[self.spinner_frame])
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize => {}
            Event::Tick => self.tick(),
            Event::Wizard => self.sync_wizard(),
            Event::Task(outcome) => self.route_task(outcome),
        }
        self.update_status_bar();
    }

    /// Give the current panel its per-frame hook
    pub fn on_render(&mut self) {
        let Some(id) = self.wizard.current_step_id() else {
            return;
        };
        let props = StepProps::new(&self.wizard, self.vim_mode);
        let event = self
            .panels
            .get_mut(id)
            .and_then(|panel| panel.on_render(&props));

        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    /// Pull the latest wizard state from the provider
    pub fn sync_wizard(&mut self) {
        let previous = self.wizard.current_step_id().map(str::to_string);
        self.wizard = self.provider.state();

        if self.wizard.current_step_id() != previous.as_deref() {
            if let Some(id) = self.wizard.current_step_id() {
                debug!("Current step is now '{}'", id);
            }
            if self.vim_mode == VimMode::Insert {
                self.vim_mode = self.vim_mode.apply(ModeAction::Escape);
            }
        }

        if self.wizard.is_completed
            && self.handoff
            && self.config.completion.exit_on_complete
            && !self.should_exit
        {
            info!("Onboarding complete, handing off to device login");
            self.should_exit = true;
        }

        self.update_status_bar();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            warn!("Onboarding aborted by user");
            self.should_exit = true;
            return;
        }

        // Clear message on any key
        self.message = None;

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        match self.vim_mode {
            VimMode::Normal => self.handle_normal_mode(key),
            VimMode::Insert => self.handle_insert_mode(key),
            VimMode::Command => self.handle_command_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(':') => {
                self.vim_mode = self.vim_mode.apply(ModeAction::EnterCommand);
                self.command_buffer.clear();
            }
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('i') | KeyCode::Char('a') => {
                if self.current_panel().is_some_and(|panel| panel.accepts_input()) {
                    self.vim_mode = self.vim_mode.apply(ModeAction::EnterInsert);
                }
            }
            KeyCode::Char('r') if self.wizard.error.is_some() => self.retry(),
            KeyCode::Char('l') | KeyCode::Right if !self.wizard.is_loading => {
                self.dispatch(StepEvent::Next)
            }
            KeyCode::Char('h') | KeyCode::Left if !self.wizard.is_loading => {
                self.dispatch(StepEvent::Previous)
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.select_step(index);
            }
            _ => self.forward_to_panel(key),
        }
    }

    fn handle_insert_mode(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.vim_mode = self.vim_mode.apply(ModeAction::Escape);
            return;
        }
        self.forward_to_panel(key);
    }

    fn handle_command_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.vim_mode = self.vim_mode.apply(ModeAction::Escape);
                self.command_buffer.clear();
            }
            KeyCode::Enter => {
                let cmd = self.command_buffer.content().to_string();
                self.vim_mode = self.vim_mode.apply(ModeAction::Execute);
                self.command_buffer.clear();
                self.execute_command(&cmd);
            }
            KeyCode::Backspace => {
                if self.command_buffer.is_empty() {
                    self.vim_mode = self.vim_mode.apply(ModeAction::Escape);
                } else {
                    self.command_buffer.delete_back();
                }
            }
            KeyCode::Char(c) => self.command_buffer.insert(c),
            _ => {}
        }
    }

    fn execute_command(&mut self, input: &str) {
        let command = match parse_command(input) {
            Ok(command) => command,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };

        match command {
            Command::Next => self.dispatch(StepEvent::Next),
            Command::Prev => self.dispatch(StepEvent::Previous),
            Command::Retry => self.retry(),
            Command::Goto(id) => {
                let stepper = HorizontalStepper::from_state(&self.wizard);
                match stepper.index_of(&id) {
                    Some(index) => self.select_step(index),
                    None => self.set_error(format!("Unknown step: {id}")),
                }
            }
            Command::Help => self.show_help = true,
            Command::Quit => {
                if self.wizard.is_completed {
                    self.should_exit = true;
                } else {
                    self.set_error("Onboarding is not complete yet (Ctrl+C aborts)");
                }
            }
        }
    }

    /// Jump to a step from the stepper; only completed steps and the current
    /// one can be picked
    fn select_step(&mut self, index: usize) {
        let stepper = HorizontalStepper::from_state(&self.wizard);
        match stepper.select(index) {
            Some(id) => {
                self.provider.go_to_step(id);
                self.sync_wizard();
            }
            None => self.set_error(format!("Step {} is not available yet", index + 1)),
        }
    }

    fn forward_to_panel(&mut self, key: KeyEvent) {
        let Some(id) = self.wizard.current_step_id() else {
            return;
        };
        let props = StepProps::new(&self.wizard, self.vim_mode);
        let event = self
            .panels
            .get_mut(id)
            .and_then(|panel| panel.handle_key(key, &props));

        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    fn route_task(&mut self, outcome: TaskOutcome) {
        let id = outcome.step_id();
        match &outcome {
            TaskOutcome::AuthSetup(Err(e))
            | TaskOutcome::ProviderSelected(Err(e))
            | TaskOutcome::AdminCreated(Err(e)) => warn!("Step '{}' failed: {}", id, e),
            _ => debug!("Step '{}' task finished", id),
        }

        let event = self
            .panels
            .get_mut(id)
            .and_then(|panel| panel.on_task(outcome));

        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    pub fn dispatch(&mut self, event: StepEvent) {
        match event {
            StepEvent::Next => {
                self.provider.next_step();
                self.sync_wizard();
            }
            StepEvent::Previous => {
                self.provider.previous_step();
                self.sync_wizard();
            }
            StepEvent::Complete => {
                let provider = self.provider.clone();
                self.spawn(async move { provider.complete_current_step().await });
            }
            StepEvent::Finish => {
                self.handoff = true;
                self.set_info("Onboarding complete!");
                let provider = self.provider.clone();
                self.spawn(async move { provider.complete_current_step().await });
            }
            StepEvent::Run(task) => {
                let steps = self.steps.clone();
                let context = Arc::clone(self.provider.context());
                let events = self.events.clone();
                self.spawn(async move {
                    let outcome = run_task(task, &steps, &context).await;
                    if events.send(Event::Task(outcome)).is_err() {
                        debug!("Event queue closed, dropping task result");
                    }
                });
            }
        }
    }

    fn retry(&mut self) {
        info!("Retrying wizard status check");
        self.provider.clear_error();
        let provider = self.provider.clone();
        self.spawn(async move { provider.refresh_status().await });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.push(tokio::spawn(task));
    }

    /// Wait for every background task started so far
    pub async fn wait_idle(&mut self) {
        while let Some(handle) = self.pending.pop() {
            if let Err(e) = handle.await {
                warn!("Background task failed: {}", e);
            }
        }
    }

    pub fn tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
        self.pending.retain(|handle| !handle.is_finished());
    }

    pub fn update_status_bar(&mut self) {
        self.status_bar = if self.vim_mode == VimMode::Command {
            StatusBarState::command_mode()
        } else if self.wizard.error.is_some() {
            StatusBarState::wizard_error()
        } else if let Some(panel) = self.current_panel() {
            panel.status(&StepProps::new(&self.wizard, self.vim_mode))
        } else if self.wizard.is_loading {
            StatusBarState::loading()
        } else {
            StatusBarState::new("", "?: help")
        };
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.message = Some(Message::error(text));
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.message = Some(Message::info(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHandler;
    use crate::onboard::DryrunDevice;

    fn test_config() -> OnboardConfig {
        let mut config = OnboardConfig::default();
        config.polling.interval_ms = 5;
        config.polling.max_attempts = 20;
        config
    }

    fn app_for(device: &Arc<DryrunDevice>, events: &EventHandler) -> OnboardApp {
        OnboardApp::new(
            test_config(),
            OnboardContext::from_device(device.clone()),
            events.sender(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut OnboardApp, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn run_command(app: &mut OnboardApp, cmd: &str) {
        app.handle_key(key(KeyCode::Char(':')));
        type_text(app, cmd);
        app.handle_key(key(KeyCode::Enter));
    }

    /// Drive background work and queued events the way the render loop does
    async fn settle(app: &mut OnboardApp, events: &mut EventHandler) {
        for _ in 0..10 {
            app.wait_idle().await;
            app.sync_wizard();
            while let Some(event) = events.try_next() {
                app.handle_event(event);
            }
            app.on_render();
        }
    }

    #[tokio::test]
    async fn test_fresh_device_full_flow() {
        let device = Arc::new(DryrunDevice::new());
        let mut events = EventHandler::detached();
        let mut app = app_for(&device, &events);

        app.start();
        settle(&mut app, &mut events).await;

        assert_eq!(device.core(), Some("flecsport".to_string()));
        assert_eq!(app.wizard.current_step_id(), Some("super-admin"));
        assert!(app.wizard.is_step_completed("auth-provider"));

        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('i')));
        assert_eq!(app.vim_mode, VimMode::Insert);
        type_text(&mut app, "S3cure!pw");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "S3cure!pw");
        app.handle_key(key(KeyCode::Enter));
        settle(&mut app, &mut events).await;

        assert_eq!(device.admin_name(), Some("admin".to_string()));
        assert!(app.wizard.is_completed);
        assert!(app.handoff);
        assert!(app.should_exit);
        assert_eq!(app.vim_mode, VimMode::Normal);
    }

    #[tokio::test]
    async fn test_onboarded_device_hands_off_right_away() {
        let device = Arc::new(DryrunDevice::onboarded());
        let mut events = EventHandler::detached();
        let mut app = app_for(&device, &events);

        app.start();
        settle(&mut app, &mut events).await;

        assert!(app.wizard.is_completed);
        assert!(app.should_exit);
        assert_eq!(app.wizard.completed_steps.len(), 3);
    }

    #[tokio::test]
    async fn test_stay_open_when_exit_disabled() {
        let device = Arc::new(DryrunDevice::onboarded());
        let mut events = EventHandler::detached();
        let mut config = test_config();
        config.completion.exit_on_complete = false;
        let mut app = OnboardApp::new(
            config,
            OnboardContext::from_device(device.clone()),
            events.sender(),
        );

        app.start();
        settle(&mut app, &mut events).await;
        assert!(app.wizard.is_completed);
        assert!(!app.should_exit);
        assert_eq!(app.status_bar, StatusBarState::finished(true));

        run_command(&mut app, "q");
        assert!(app.should_exit);
    }

    #[tokio::test]
    async fn test_locked_steps_cannot_be_selected() {
        let device = Arc::new(DryrunDevice::new());
        let events = EventHandler::detached();
        let mut app = app_for(&device, &events);

        app.start();
        app.wait_idle().await;
        app.sync_wizard();
        assert_eq!(app.wizard.current_step_id(), Some("auth-provider"));

        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.wizard.current_step_id(), Some("auth-provider"));
        assert_eq!(
            app.message.as_ref().map(|m| m.text.as_str()),
            Some("Step 3 is not available yet")
        );

        run_command(&mut app, "goto super-admin");
        assert_eq!(app.wizard.current_step_id(), Some("auth-provider"));
        assert!(app.message.as_ref().is_some_and(|m| m.is_error));
    }

    #[tokio::test]
    async fn test_quit_refused_until_complete() {
        let device = Arc::new(DryrunDevice::new());
        let events = EventHandler::detached();
        let mut app = app_for(&device, &events);

        run_command(&mut app, "q");
        assert!(!app.should_exit);
        assert_eq!(
            app.message.as_ref().map(|m| m.text.as_str()),
            Some("Onboarding is not complete yet (Ctrl+C aborts)")
        );

        run_command(&mut app, "bogus");
        assert_eq!(
            app.message.as_ref().map(|m| m.text.as_str()),
            Some("Unknown command: bogus")
        );

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_exit);
        assert!(!app.handoff);
    }

    #[tokio::test]
    async fn test_provider_setup_retry_after_device_failure() {
        let device = Arc::new(DryrunDevice::new());
        device.set_unreachable(true);
        let mut events = EventHandler::detached();
        let mut app = app_for(&device, &events);

        app.start();
        settle(&mut app, &mut events).await;
        assert_eq!(app.wizard.current_step_id(), Some("auth-provider"));
        assert_eq!(
            app.status_bar,
            StatusBarState::new("Provider setup failed", "r: retry  h: previous")
        );

        device.set_unreachable(false);
        app.handle_key(key(KeyCode::Char('r')));
        settle(&mut app, &mut events).await;

        assert_eq!(device.core(), Some("flecsport".to_string()));
        assert_eq!(app.wizard.current_step_id(), Some("super-admin"));
    }

    #[tokio::test]
    async fn test_insert_mode_needs_a_form() {
        let device = Arc::new(DryrunDevice::new());
        let events = EventHandler::detached();
        let mut app = app_for(&device, &events);

        app.start();
        app.wait_idle().await;
        app.sync_wizard();

        app.handle_key(key(KeyCode::Char('i')));
        assert_eq!(app.vim_mode, VimMode::Normal);
    }
}
