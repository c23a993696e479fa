use ratatui::{prelude::*, widgets::Paragraph};

use crate::ui::Theme;
use crate::vim::VimMode;

/// Key hints shown in the bottom line, set by the app and the step panels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBarState {
    pub left_hint: String,
    pub right_hint: String,
}

impl StatusBarState {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left_hint: left.into(),
            right_hint: right.into(),
        }
    }

    pub fn command_mode() -> Self {
        Self::new("", "Enter: run  Esc: cancel")
    }

    pub fn form_insert() -> Self {
        Self::new("Type to enter text", "Esc: normal  Tab: next field")
    }

    pub fn loading() -> Self {
        Self::new("Please wait...", "")
    }

    pub fn wizard_error() -> Self {
        Self::new("Status check failed", "r: retry  :help")
    }

    pub fn finished(can_close: bool) -> Self {
        if can_close {
            Self::new("Onboarding complete", ":q close")
        } else {
            Self::new("Onboarding complete", "")
        }
    }
}

pub struct StatusLine<'a> {
    pub mode: VimMode,
    pub command: Option<&'a str>,
    pub state: &'a StatusBarState,
    pub completed: usize,
    pub total: usize,
    pub spinner: Option<char>,
}

pub fn draw_status_bar(frame: &mut Frame, area: Rect, line: &StatusLine, theme: &Theme) {
    let mode_span = Span::styled(format!(" {} ", line.mode.label()), theme.mode_style(line.mode));

    let after_mode = match line.command {
        Some(cmd) => Span::styled(format!(":{cmd}"), theme.style()),
        None => Span::styled(line.state.left_hint.clone(), theme.muted_style()),
    };

    let mut left = vec![mode_span, Span::raw(" ")];
    if let Some(spinner) = line.spinner {
        left.push(Span::styled(format!("{spinner} "), theme.secondary_style()));
    }
    left.push(after_mode);

    frame.render_widget(
        Paragraph::new(Line::from(left)),
        Rect::new(area.x, area.y, area.width * 2 / 3, 1),
    );

    let progress = format!("{}/{}", line.completed, line.total);
    let right_text = if line.state.right_hint.is_empty() {
        progress
    } else {
        format!("{progress}  {}", line.state.right_hint)
    };

    frame.render_widget(
        Paragraph::new(right_text)
            .style(theme.muted_style())
            .alignment(Alignment::Right),
        Rect::new(area.x + area.width / 3, area.y, area.width - area.width / 3, 1),
    );
}
