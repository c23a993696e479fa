/// Editing mode of the wizard UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VimMode {
    /// Keys navigate the wizard and drive the current step
    #[default]
    Normal,
    /// Keys go into the focused form field
    Insert,
    /// Keys build a `:` command
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeAction {
    EnterInsert,
    EnterCommand,
    Escape,
    Execute,
}

impl VimMode {
    pub fn label(self) -> &'static str {
        match self {
            VimMode::Normal => "NORMAL",
            VimMode::Insert => "INSERT",
            VimMode::Command => "COMMAND",
        }
    }

    /// Next mode for `action`; actions that make no sense in the current
    /// mode leave it unchanged
    pub fn apply(self, action: ModeAction) -> VimMode {
        use ModeAction::*;
        match self {
            VimMode::Normal => match action {
                EnterInsert => VimMode::Insert,
                EnterCommand => VimMode::Command,
                _ => self,
            },
            VimMode::Insert if action == Escape => VimMode::Normal,
            VimMode::Command if matches!(action, Escape | Execute) => VimMode::Normal,
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(VimMode::Normal.apply(ModeAction::EnterInsert), VimMode::Insert);
        assert_eq!(VimMode::Normal.apply(ModeAction::EnterCommand), VimMode::Command);
        assert_eq!(VimMode::Insert.apply(ModeAction::Escape), VimMode::Normal);
        assert_eq!(VimMode::Command.apply(ModeAction::Execute), VimMode::Normal);
        // insert mode cannot jump straight to command mode
        assert_eq!(VimMode::Insert.apply(ModeAction::EnterCommand), VimMode::Insert);
    }
}
