use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::ui::Theme;

/// Transient feedback shown below the step panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

impl Message {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }
}

pub fn draw_message_panel(frame: &mut Frame, area: Rect, message: Option<&Message>, theme: &Theme) {
    let Some(message) = message else {
        return;
    };

    let (title, border_style, text_style) = if message.is_error {
        (" Error ", theme.error_style(), theme.error_style())
    } else {
        (" Info ", theme.secondary_style(), theme.style())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
        .title_style(border_style.add_modifier(Modifier::BOLD));

    let content = Line::from(vec![
        Span::styled(message.text.as_str(), text_style),
        Span::styled(" (press any key to dismiss)", theme.muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(content).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

/// Wizard-level failure with the retry hint
pub fn draw_wizard_error(frame: &mut Frame, area: Rect, error: &str, theme: &Theme) {
    if area.height == 0 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.error_style())
        .title(" Error ")
        .title_style(theme.error_style().add_modifier(Modifier::BOLD));

    let content = Line::from(vec![
        Span::styled(error, theme.error_style()),
        Span::raw("  "),
        Span::styled("r: Retry", theme.primary_style().add_modifier(Modifier::BOLD)),
    ]);

    frame.render_widget(
        Paragraph::new(content).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
