use thiserror::Error;

/// A `:` command typed in command mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Retry,
    Goto(String),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    MissingArgument(&'static str),
}

pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let mut words = input.split_whitespace();
    let name = words.next().unwrap_or("");
    let arg = words.next();

    match name {
        "next" | "n" => Ok(Command::Next),
        "prev" | "previous" | "p" => Ok(Command::Prev),
        "retry" | "r" => Ok(Command::Retry),
        "goto" | "g" => arg
            .map(|id| Command::Goto(id.to_string()))
            .ok_or(CommandError::MissingArgument("goto <step-id>")),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "" => Err(CommandError::Unknown("empty command".to_string())),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}
