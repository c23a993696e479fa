mod layout;
pub mod panels;
mod theme;
pub mod widgets;

pub use layout::Layout;
pub use theme::Theme;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::OnboardApp;
use panels::StepProps;
use widgets::{HorizontalStepper, StatusLine};

pub fn draw(frame: &mut Frame, app: &OnboardApp) {
    let layout = Layout::new(frame.area(), app.wizard.error.is_some());

    frame.render_widget(Clear, layout.full);
    draw_header(frame, layout.header, app);
    HorizontalStepper::from_state(&app.wizard).draw(frame, layout.stepper, &app.theme);

    if let Some(error) = &app.wizard.error {
        widgets::draw_wizard_error(frame, layout.error, error, &app.theme);
    }

    match app.current_panel() {
        Some(panel) => {
            let props = StepProps::new(&app.wizard, app.vim_mode);
            panel.draw(frame, layout.content, &props, &app.theme);
        }
        None if app.wizard.is_loading || app.wizard.all_steps.is_empty() => {
            frame.render_widget(
                Paragraph::new("Loading...")
                    .style(app.theme.muted_style())
                    .alignment(Alignment::Center),
                Rect::new(
                    layout.content.x,
                    layout.content.y + layout.content.height / 2,
                    layout.content.width,
                    1,
                ),
            );
        }
        None => {}
    }

    widgets::draw_message_panel(frame, layout.message, app.message.as_ref(), &app.theme);

    let command = (app.vim_mode == crate::vim::VimMode::Command).then(|| app.command_buffer.content());
    let status = StatusLine {
        mode: app.vim_mode,
        command,
        state: &app.status_bar,
        completed: app.wizard.completed_steps.len(),
        total: app.wizard.all_steps.len(),
        spinner: app.spinner(),
    };
    widgets::draw_status_bar(frame, layout.status, &status, &app.theme);

    if app.show_help {
        draw_help(frame, layout.content, &app.theme);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &OnboardApp) {
    let title = format!(" {} ", app.config.general.title);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(title, app.theme.primary_style().add_modifier(Modifier::BOLD)),
            Span::styled(concat!("v", env!("CARGO_PKG_VERSION")), app.theme.muted_style()),
        ])),
        area,
    );

    frame.render_widget(
        Paragraph::new(format!("[Device: {}] ", app.device_label()))
            .style(if app.is_dryrun() {
                app.theme.secondary_style()
            } else {
                app.theme.muted_style()
            })
            .alignment(Alignment::Right),
        area,
    );
}

fn draw_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)));
    let help_text = vec![
        heading("Normal Mode"),
        Line::from("  h/l      Previous/next step"),
        Line::from("  1-9      Jump to a completed step"),
        Line::from("  j/k      Move within the step"),
        Line::from("  i        Edit form fields"),
        Line::from("  r        Retry failed status check"),
        Line::from("  Enter    Run the step"),
        Line::from(""),
        heading("Insert Mode"),
        Line::from("  Escape   Return to normal mode"),
        Line::from("  Tab      Next field"),
        Line::from("  Enter    Next field / submit"),
        Line::from(""),
        heading("Commands"),
        Line::from("  :next  :prev      Move between steps"),
        Line::from("  :goto <step-id>   Jump to a step"),
        Line::from("  :retry            Re-check wizard status"),
        Line::from("  :help             Show this help"),
        Line::from("  :q                Close when complete"),
        Line::from(""),
        Line::from(Span::styled("Press Escape to close", theme.muted_style())),
    ];

    let height = help_text.len() as u16 + 2;
    let width = 45u16.min(area.width.saturating_sub(4));
    let help_area = Layout::centered_box(area, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Help ")
        .title_style(theme.title_style());

    frame.render_widget(Clear, help_area);
    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}
