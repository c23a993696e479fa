use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Screen regions of the wizard
pub struct Layout {
    pub full: Rect,
    pub header: Rect,
    pub stepper: Rect,
    /// Zero height unless the wizard reports an error
    pub error: Rect,
    pub content: Rect,
    pub message: Rect,
    pub status: Rect,
}

impl Layout {
    pub fn new(area: Rect, show_error: bool) -> Self {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),                               // Header
                Constraint::Length(3),                               // Stepper
                Constraint::Length(if show_error { 4 } else { 0 }),  // Wizard error
                Constraint::Min(8),                                  // Step panel
                Constraint::Length(3),                               // Message panel
                Constraint::Length(1),                               // Status bar
            ])
            .split(area);

        Self {
            full: area,
            header: chunks[0],
            stepper: chunks[1],
            error: chunks[2],
            content: chunks[3],
            message: chunks[4],
            status: chunks[5],
        }
    }

    pub fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width);
        let height = height.min(area.height);
        Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        )
    }
}
