use ratatui::style::{Color, Modifier, Style};

use crate::vim::VimMode;

/// Palette for the onboarding screens. Terminal default background throughout.
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,
    pub info: Color,
    pub text: Color,
    pub error: Color,
    pub weak: Color,
    pub success: Color,
    pub frame: Color,
    pub dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Yellow,
            info: Color::Cyan,
            text: Color::White,
            error: Color::Red,
            weak: Color::LightYellow,
            success: Color::Green,
            frame: Color::DarkGray,
            dim: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn primary_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn secondary_style(&self) -> Style {
        Style::default().fg(self.info)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.frame)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn title_style(&self) -> Style {
        self.primary_style().add_modifier(Modifier::BOLD)
    }

    /// Action button at the bottom of a step. Greyed out while its task runs.
    pub fn button_style(&self, busy: bool) -> Style {
        let base = if busy { self.muted_style() } else { self.title_style() };
        base.add_modifier(Modifier::REVERSED)
    }

    /// Row in a pick list
    pub fn selection_style(&self, selected: bool) -> Style {
        if selected {
            self.primary_style().add_modifier(Modifier::REVERSED)
        } else {
            self.style()
        }
    }

    pub fn mode_style(&self, mode: VimMode) -> Style {
        let color = match mode {
            VimMode::Normal => self.info,
            VimMode::Insert => self.success,
            VimMode::Command => self.accent,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Filled part of the password strength bar, one color per strength label
    pub fn strength_style(&self, score: u8) -> Style {
        let color = match score {
            0..=25 => self.error,
            26..=50 => self.weak,
            51..=75 => self.info,
            _ => self.success,
        };
        Style::default().fg(color)
    }
}
