use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;

use super::{StepEvent, StepPanel, StepProps, StepTask, TaskOutcome, line_at};
use crate::onboard::steps::{FormErrors, password_strength, validate_form};
use crate::ui::Theme;
use crate::ui::widgets::StatusBarState;
use crate::vim::{InputBuffer, VimMode};

const FIELD_COUNT: usize = 3;
const STRENGTH_BAR_WIDTH: usize = 20;

/// Form for the initial administrator account
pub struct SuperAdminPanel {
    username: InputBuffer,
    password: InputBuffer,
    confirm: InputBuffer,
    focus: usize,
    reveal: bool,
    errors: FormErrors,
    general_error: Option<String>,
    busy: bool,
}

impl SuperAdminPanel {
    pub fn new(default_username: &str) -> Self {
        Self {
            username: InputBuffer::with_value(default_username),
            password: InputBuffer::masked(),
            confirm: InputBuffer::masked(),
            focus: 0,
            reveal: false,
            errors: FormErrors::default(),
            general_error: None,
            busy: false,
        }
    }

    fn focused_buffer(&mut self) -> &mut InputBuffer {
        match self.focus {
            0 => &mut self.username,
            1 => &mut self.password,
            _ => &mut self.confirm,
        }
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1).min(FIELD_COUNT - 1);
    }

    fn focus_prev(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    fn submit(&mut self) -> Option<StepEvent> {
        self.general_error = None;
        match validate_form(
            self.username.content(),
            self.password.content(),
            self.confirm.content(),
        ) {
            Ok(admin) => {
                self.errors = FormErrors::default();
                self.busy = true;
                Some(StepEvent::Run(StepTask::CreateAdmin(admin)))
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }

    fn handle_insert(&mut self, key: KeyEvent) -> Option<StepEvent> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            let buffer = self.focused_buffer();
            match key.code {
                KeyCode::Char('u') => buffer.clear(),
                KeyCode::Char('a') => buffer.move_start(),
                KeyCode::Char('e') => buffer.move_end(),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Enter if self.focus + 1 < FIELD_COUNT => self.focus_next(),
            KeyCode::Enter => return self.submit(),
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_prev(),
            KeyCode::Backspace => {
                self.focused_buffer().delete_back();
            }
            KeyCode::Delete => {
                self.focused_buffer().delete_forward();
            }
            KeyCode::Left => self.focused_buffer().move_left(),
            KeyCode::Right => self.focused_buffer().move_right(),
            KeyCode::Home => self.focused_buffer().move_start(),
            KeyCode::End => self.focused_buffer().move_end(),
            KeyCode::Char(c) => self.focused_buffer().insert(c),
            _ => {}
        }
        None
    }

    fn draw_field(
        &self,
        frame: &mut Frame,
        area: Rect,
        dy: u16,
        idx: usize,
        props: &StepProps,
        theme: &Theme,
    ) {
        let (label, buffer, error) = match idx {
            0 => ("Username", &self.username, &self.errors.username),
            1 => ("Password", &self.password, &self.errors.password),
            _ => ("Confirm", &self.confirm, &self.errors.confirm),
        };
        let focused = idx == self.focus;

        let shown = if self.reveal {
            buffer.content().to_string()
        } else {
            buffer.display('*')
        };

        let label_style = if focused { theme.primary_style() } else { theme.style() };
        let mut spans = vec![Span::styled(format!("{label:<10}"), label_style)];

        if focused && props.mode == VimMode::Insert {
            let before: String = shown.chars().take(buffer.cursor()).collect();
            let after: String = shown.chars().skip(buffer.cursor()).collect();
            spans.push(Span::styled(before, theme.style()));
            spans.push(Span::styled("|", theme.title_style()));
            spans.push(Span::styled(after, theme.style()));
        } else if shown.is_empty() {
            spans.push(Span::styled("(empty)", theme.muted_style()));
        } else {
            let style = if focused { theme.style().underlined() } else { theme.muted_style() };
            spans.push(Span::styled(shown, style));
        }
        line_at(frame, area, dy, Line::from(spans));

        if let Some(error) = error {
            line_at(
                frame,
                area,
                dy + 1,
                Line::styled(format!("{:10}{error}", ""), theme.error_style()),
            );
        }
    }

    fn draw_strength(&self, frame: &mut Frame, area: Rect, dy: u16, theme: &Theme) {
        if self.password.is_empty() {
            return;
        }
        let strength = password_strength(self.password.content());
        let filled = usize::from(strength.score) * STRENGTH_BAR_WIDTH / 125;

        let line = Line::from(vec![
            Span::styled(format!("{:10}", ""), theme.style()),
            Span::styled("█".repeat(filled), theme.strength_style(strength.score)),
            Span::styled("░".repeat(STRENGTH_BAR_WIDTH - filled), theme.muted_style()),
            Span::styled(format!(" Password Strength: {}", strength.label), theme.muted_style()),
        ]);
        line_at(frame, area, dy, line);
    }
}

impl StepPanel for SuperAdminPanel {
    fn draw(&self, frame: &mut Frame, area: Rect, props: &StepProps, theme: &Theme) {
        let area = area.inner(Margin::new(2, 1));

        line_at(frame, area, 0, Line::styled("Create Super Administrator", theme.title_style()));
        line_at(
            frame,
            area,
            1,
            Line::styled(
                "Create the initial administrator account for your device. This account will have full access to manage the system.",
                theme.muted_style(),
            ),
        );

        let mut dy = 3;
        if let Some(error) = &self.general_error {
            line_at(frame, area, dy, Line::styled(error.as_str(), theme.error_style()));
            dy += 2;
        }

        self.draw_field(frame, area, dy, 0, props, theme);
        dy += 2;
        self.draw_field(frame, area, dy, 1, props, theme);
        dy += 2;
        self.draw_strength(frame, area, dy, theme);
        dy += 1;
        self.draw_field(frame, area, dy, 2, props, theme);
        dy += 3;

        let working = self.busy || props.is_loading;
        let button = if working {
            " Creating Admin... "
        } else {
            " [Enter] Create Administrator "
        };
        line_at(frame, area, dy, Line::styled(button, theme.button_style(working)));
    }

    fn handle_key(&mut self, key: KeyEvent, props: &StepProps) -> Option<StepEvent> {
        if self.busy || props.is_loading {
            return None;
        }

        if props.mode == VimMode::Insert {
            return self.handle_insert(key);
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => self.focus_next(),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => self.focus_prev(),
            KeyCode::Char('v') => self.reveal = !self.reveal,
            KeyCode::Enter => return self.submit(),
            _ => {}
        }
        None
    }

    fn on_task(&mut self, outcome: TaskOutcome) -> Option<StepEvent> {
        let TaskOutcome::AdminCreated(result) = outcome else {
            return None;
        };
        self.busy = false;

        match result {
            Ok(_) => {
                self.password.clear();
                self.confirm.clear();
                Some(StepEvent::Complete)
            }
            Err(e) => {
                self.general_error = Some(e);
                None
            }
        }
    }

    fn accepts_input(&self) -> bool {
        true
    }

    fn status(&self, props: &StepProps) -> StatusBarState {
        if self.busy || props.is_loading {
            StatusBarState::loading()
        } else if props.mode == VimMode::Insert {
            StatusBarState::form_insert()
        } else {
            StatusBarState::new("j/k: fields  i: edit  v: show", "Enter: create")
        }
    }
}
