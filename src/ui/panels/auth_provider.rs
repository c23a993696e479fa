use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::{StepEvent, StepPanel, StepProps, StepTask, TaskOutcome, line_at};
use crate::onboard::AuthProviders;
use crate::onboard::steps::AuthSetupOutcome;
use crate::ui::Theme;
use crate::ui::widgets::StatusBarState;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SetupMode {
    /// Automated setup is running
    Checking,
    Select {
        providers: AuthProviders,
        selected: usize,
    },
    /// `Some` when we configured the provider ourselves
    Completed(Option<String>),
}

pub struct AuthProviderPanel {
    mode: SetupMode,
    started: bool,
    busy: bool,
    error: Option<String>,
}

impl Default for AuthProviderPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProviderPanel {
    pub fn new() -> Self {
        Self {
            mode: SetupMode::Checking,
            started: false,
            busy: false,
            error: None,
        }
    }

    fn start_setup(&mut self) -> Option<StepEvent> {
        self.started = true;
        self.busy = true;
        self.error = None;
        self.mode = SetupMode::Checking;
        Some(StepEvent::Run(StepTask::AuthSetup))
    }

    fn completed(&mut self, provider: Option<String>) -> Option<StepEvent> {
        self.mode = SetupMode::Completed(provider);
        Some(StepEvent::Complete)
    }

    fn draw_selection(
        &self,
        frame: &mut Frame,
        area: Rect,
        providers: &AuthProviders,
        selected: usize,
        working: bool,
        theme: &Theme,
    ) {
        let ids = providers.provider_ids();
        let notice = if ids.len() > 1 {
            "Multiple authentication providers are available. The first one is pre-selected."
        } else {
            "Authentication provider found. Please confirm to proceed."
        };
        line_at(frame, area, 0, Line::styled(notice, theme.secondary_style()));

        for (idx, id) in ids.iter().enumerate() {
            let is_selected = idx == selected;
            let marker = if is_selected { ">" } else { " " };
            let label = format!(" {marker} {} ({id})", providers.display_name(id));
            line_at(frame, area, 2 + idx as u16, Line::styled(label, theme.selection_style(is_selected)));
        }

        let button = if working {
            " Setting up... "
        } else {
            " [Enter] Setup Provider "
        };
        line_at(
            frame,
            area,
            3 + ids.len() as u16,
            Line::styled(button, theme.button_style(working)),
        );
    }
}

impl StepPanel for AuthProviderPanel {
    fn draw(&self, frame: &mut Frame, area: Rect, props: &StepProps, theme: &Theme) {
        let area = area.inner(Margin::new(2, 1));

        if let Some(error) = &self.error {
            line_at(
                frame,
                area,
                0,
                Line::styled("Authentication Provider Setup Error", theme.error_style().bold()),
            );
            line_at(frame, area, 2, Line::styled(error.as_str(), theme.error_style()));
            line_at(
                frame,
                area,
                4,
                Line::styled("r: Retry   h: Previous", theme.muted_style()),
            );
            return;
        }

        line_at(
            frame,
            area,
            0,
            Line::styled("Setup Authentication Provider", theme.title_style()),
        );
        line_at(
            frame,
            area,
            1,
            Line::styled(
                "Configure the default authentication provider for your device.",
                theme.muted_style(),
            ),
        );
        let body = Rect::new(area.x, area.y + 3, area.width, area.height.saturating_sub(3));

        match &self.mode {
            SetupMode::Checking => {
                line_at(
                    frame,
                    body,
                    0,
                    Line::styled("Checking authentication provider status...", theme.style()),
                );
                line_at(
                    frame,
                    body,
                    2,
                    Line::styled(
                        "If no provider exists the built-in one is installed. This can take a few seconds.",
                        theme.muted_style(),
                    ),
                );
            }
            SetupMode::Select { providers, selected } => {
                let working = self.busy || props.is_loading;
                self.draw_selection(frame, body, providers, *selected, working, theme);
            }
            SetupMode::Completed(provider) => {
                line_at(
                    frame,
                    body,
                    0,
                    Line::styled(
                        "Authentication provider is configured and active.",
                        theme.success_style(),
                    ),
                );
                if let Some(id) = provider {
                    line_at(frame, body, 1, Line::styled(format!("Provider: {id}"), theme.style()));
                }
                line_at(
                    frame,
                    body,
                    3,
                    Line::styled(" [Enter] Continue ", theme.button_style(false)),
                );
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, props: &StepProps) -> Option<StepEvent> {
        if self.busy || props.is_loading {
            return None;
        }

        if self.error.is_some() {
            return match key.code {
                KeyCode::Char('r') | KeyCode::Enter => self.start_setup(),
                _ => None,
            };
        }

        match &mut self.mode {
            SetupMode::Checking => None,
            SetupMode::Select { providers, selected } => {
                let count = providers.providers.len();
                match key.code {
                    KeyCode::Char('j') | KeyCode::Down if *selected + 1 < count => {
                        *selected += 1;
                        None
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        *selected = selected.saturating_sub(1);
                        None
                    }
                    KeyCode::Enter => {
                        let id = providers.provider_ids().get(*selected).cloned()?;
                        self.busy = true;
                        Some(StepEvent::Run(StepTask::SelectProvider(id)))
                    }
                    _ => None,
                }
            }
            SetupMode::Completed(_) => match key.code {
                KeyCode::Enter => Some(StepEvent::Next),
                _ => None,
            },
        }
    }

    fn on_render(&mut self, _props: &StepProps) -> Option<StepEvent> {
        if self.started {
            return None;
        }
        self.start_setup()
    }

    fn on_task(&mut self, outcome: TaskOutcome) -> Option<StepEvent> {
        self.busy = false;
        match outcome {
            TaskOutcome::AuthSetup(Ok(AuthSetupOutcome::AlreadyConfigured)) => self.completed(None),
            TaskOutcome::AuthSetup(Ok(AuthSetupOutcome::Configured(id)))
            | TaskOutcome::ProviderSelected(Ok(id)) => self.completed(Some(id)),
            TaskOutcome::AuthSetup(Ok(AuthSetupOutcome::SelectionRequired(providers))) => {
                self.mode = SetupMode::Select {
                    providers,
                    selected: 0,
                };
                None
            }
            TaskOutcome::AuthSetup(Err(e)) | TaskOutcome::ProviderSelected(Err(e)) => {
                self.error = Some(e);
                None
            }
            TaskOutcome::AdminCreated(_) => None,
        }
    }

    fn status(&self, props: &StepProps) -> StatusBarState {
        if self.busy || props.is_loading {
            return StatusBarState::loading();
        }
        if self.error.is_some() {
            return StatusBarState::new("Provider setup failed", "r: retry  h: previous");
        }
        match self.mode {
            SetupMode::Checking => StatusBarState::loading(),
            SetupMode::Select { .. } => StatusBarState::new("j/k: choose provider", "Enter: setup"),
            SetupMode::Completed(_) => StatusBarState::new("Provider configured", "Enter/l: continue"),
        }
    }
}
