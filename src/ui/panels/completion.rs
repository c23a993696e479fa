use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::{StepEvent, StepPanel, StepProps, line_at};
use crate::onboard::steps::CompletionStep;
use crate::ui::Theme;
use crate::ui::widgets::StatusBarState;

/// Success screen. Reaching it finishes the wizard.
pub struct CompletionPanel {
    step: Arc<CompletionStep>,
}

impl CompletionPanel {
    pub fn new(step: Arc<CompletionStep>) -> Self {
        Self { step }
    }
}

impl StepPanel for CompletionPanel {
    fn draw(&self, frame: &mut Frame, area: Rect, _props: &StepProps, theme: &Theme) {
        let area = area.inner(Margin::new(2, 1));
        let centered = |text: &'static str, style: Style| Line::styled(text, style).alignment(Alignment::Center);

        line_at(frame, area, 1, centered("✓", theme.success_style().bold()));
        line_at(frame, area, 3, centered("Onboarding Complete!", theme.title_style()));
        line_at(
            frame,
            area,
            5,
            centered(
                "Your device has been successfully configured and is ready to use.",
                theme.style(),
            ),
        );
        line_at(
            frame,
            area,
            6,
            centered(
                "You can now start using your device with full administrative access.",
                theme.muted_style(),
            ),
        );
    }

    fn handle_key(&mut self, key: KeyEvent, props: &StepProps) -> Option<StepEvent> {
        match key.code {
            KeyCode::Enter if !self.step.has_fired() => self.on_render(props),
            _ => None,
        }
    }

    /// Finishes the wizard the first time the screen is shown
    fn on_render(&mut self, _props: &StepProps) -> Option<StepEvent> {
        self.step.fire().then_some(StepEvent::Finish)
    }

    fn status(&self, _props: &StepProps) -> StatusBarState {
        StatusBarState::finished(self.step.has_fired())
    }
}
