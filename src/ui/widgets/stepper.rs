use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::onboard::steps::short_name;
use crate::ui::Theme;
use crate::wizard::WizardState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepperItem {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// One label per registered step with completed/current marks
#[derive(Debug, Clone, Default)]
pub struct HorizontalStepper {
    items: Vec<StepperItem>,
    /// Index of the active step; the first step when nothing is current
    current: usize,
}

impl HorizontalStepper {
    pub fn from_state<C: Send + Sync>(state: &WizardState<C>) -> Self {
        let items = state
            .all_steps
            .iter()
            .map(|step| StepperItem {
                id: step.id().to_string(),
                title: step.title().to_string(),
                completed: state.is_step_completed(step.id()),
            })
            .collect();

        Self {
            items,
            current: state.current_index().unwrap_or(0),
        }
    }

    pub fn items(&self) -> &[StepperItem] {
        &self.items
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// A step can be picked only if it is completed or already current
    pub fn can_select(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|item| item.completed || index == self.current)
    }

    /// Id of the step at `index` if the selection rule allows it
    pub fn select(&self, index: usize) -> Option<&str> {
        self.can_select(index)
            .then(|| self.items[index].id.as_str())
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Columns needed to show every full title
    fn full_width(&self) -> usize {
        let labels: usize = self
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| format!("[ ] {}. {}", idx + 1, item.title).chars().count())
            .sum();
        labels + self.items.len().saturating_sub(1) * 4
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(theme.border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.items.is_empty() || inner.height == 0 {
            return;
        }

        let compact = self.full_width() > usize::from(inner.width);
        let mut spans = Vec::with_capacity(self.items.len() * 2);
        for (idx, item) in self.items.iter().enumerate() {
            if idx > 0 {
                spans.push(Span::styled(" ── ", theme.border_style()));
            }

            let is_current = idx == self.current;
            let (mark, style) = if is_current {
                ("[>]", theme.title_style())
            } else if item.completed {
                ("[x]", theme.success_style())
            } else {
                ("[ ]", theme.muted_style())
            };
            let title = if compact {
                short_name(&item.id, &item.title)
            } else {
                item.title.as_str()
            };
            spans.push(Span::styled(format!("{mark} {}. {title}", idx + 1), style));
        }

        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
            Rect::new(inner.x, inner.y + inner.height / 2, inner.width, 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardStep;
    use crate::wizard::testing::MockStep;
    use std::sync::Arc;

    fn state(completed: &[&str], current: Option<&str>) -> WizardState<()> {
        let all_steps: Vec<Arc<dyn WizardStep<()>>> = vec![
            MockStep::new("a").titled("First").into_arc(),
            MockStep::new("b").titled("Second").into_arc(),
            MockStep::new("c").titled("Third").into_arc(),
        ];
        let current_step = current.and_then(|id| all_steps.iter().find(|s| s.id() == id).cloned());

        WizardState {
            current_step,
            completed_steps: completed.iter().map(|id| id.to_string()).collect(),
            all_steps,
            ..WizardState::default()
        }
    }

    #[test]
    fn test_items_follow_state() {
        let stepper = HorizontalStepper::from_state(&state(&["a"], Some("b")));
        assert_eq!(stepper.current(), 1);
        assert!(stepper.items()[0].completed);
        assert_eq!(stepper.items()[1].title, "Second");
        assert_eq!(stepper.index_of("c"), Some(2));
    }

    #[test]
    fn test_only_completed_or_current_is_selectable() {
        let stepper = HorizontalStepper::from_state(&state(&["a"], Some("b")));
        assert_eq!(stepper.select(0), Some("a"));
        assert_eq!(stepper.select(1), Some("b"));
        assert_eq!(stepper.select(2), None);
        assert!(!stepper.can_select(7));
    }

    #[test]
    fn test_full_width_counts_separators() {
        let stepper = HorizontalStepper::from_state(&state(&[], None));
        // "[ ] 1. First" + " ── " + "[ ] 2. Second" + " ── " + "[ ] 3. Third"
        assert_eq!(stepper.full_width(), 12 + 4 + 13 + 4 + 12);
    }

    #[test]
    fn test_no_current_step_defaults_to_first() {
        let stepper = HorizontalStepper::from_state(&state(&[], None));
        assert_eq!(stepper.current(), 0);
        assert!(stepper.can_select(0));
        assert!(!stepper.can_select(1));
    }
}
