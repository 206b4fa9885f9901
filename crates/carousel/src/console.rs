//! Command console grammar: `help`, `list`, `home`, `about`, `goto N`.
//! Parsing is split from execution so the renderer-side console surface
//! stays a thin shell around `parse`.

use crate::PanelDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Home,
    About,
    /// 0-indexed, already validated against the panel count.
    Goto(usize),
}

impl Command {
    /// Navigation-producing commands close the console; `help` and `list`
    /// leave it open for further input.
    pub fn closes_console(self) -> bool {
        matches!(self, Command::Home | Command::About | Command::Goto(_))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("invalid project number: {0}")]
    InvalidNumber(String),
    #[error("project number {requested} is out of range (1-{count})")]
    OutOfRange { requested: usize, count: usize },
}

/// Parses one console line. `goto` arguments are 1-indexed on the way in
/// and 0-indexed in the returned command.
pub fn parse(input: &str, panel_count: usize) -> Result<Command, ConsoleError> {
    let normalized = input.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(ConsoleError::Empty);
    }

    let mut parts = normalized.split_whitespace();
    let action = parts.next().unwrap_or_default();
    let argument = parts.next();

    match action {
        "help" => Ok(Command::Help),
        "list" => Ok(Command::List),
        "home" => Ok(Command::Home),
        "about" => Ok(Command::About),
        "goto" => {
            let raw = argument.ok_or_else(|| ConsoleError::InvalidNumber("<missing>".into()))?;
            let number: usize = raw
                .parse()
                .map_err(|_| ConsoleError::InvalidNumber(raw.to_string()))?;
            if number == 0 || number > panel_count {
                return Err(ConsoleError::OutOfRange {
                    requested: number,
                    count: panel_count,
                });
            }
            Ok(Command::Goto(number - 1))
        }
        other => Err(ConsoleError::Unknown(other.to_string())),
    }
}

pub fn help_lines() -> Vec<String> {
    vec![
        "--- AVAILABLE COMMANDS ---".into(),
        "home: navigate to the first project".into(),
        "about: navigate to the last project".into(),
        "goto <number>: navigate to a specific project (e.g. goto 3)".into(),
        "list: show all project titles".into(),
        "help: show this summary".into(),
    ]
}

pub fn list_lines(panels: &[PanelDescriptor]) -> Vec<String> {
    let mut lines = vec!["--- PROJECT LIST ---".to_string()];
    lines.extend(
        panels
            .iter()
            .map(|panel| format!("{}: {}", panel.index + 1, panel.title)),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(parse("home", 4), Ok(Command::Home));
        assert_eq!(parse("  ABOUT  ", 4), Ok(Command::About));
        assert_eq!(parse("goto 3", 4), Ok(Command::Goto(2)));
    }

    #[test]
    fn goto_out_of_range_is_an_error_not_a_crash() {
        assert_eq!(
            parse("goto 99", 4),
            Err(ConsoleError::OutOfRange {
                requested: 99,
                count: 4
            })
        );
        assert_eq!(
            parse("goto 0", 4),
            Err(ConsoleError::OutOfRange {
                requested: 0,
                count: 4
            })
        );
    }

    #[test]
    fn goto_with_garbage_argument_reports_invalid_number() {
        assert_eq!(
            parse("goto xyz", 4),
            Err(ConsoleError::InvalidNumber("xyz".into()))
        );
        assert!(matches!(
            parse("goto", 4),
            Err(ConsoleError::InvalidNumber(_))
        ));
    }

    #[test]
    fn unknown_commands_are_reported_as_warnings_upstream() {
        assert_eq!(
            parse("teleport 3", 4),
            Err(ConsoleError::Unknown("teleport".into()))
        );
        assert_eq!(parse("   ", 4), Err(ConsoleError::Empty));
    }

    #[test]
    fn only_navigation_commands_close_the_console() {
        assert!(Command::Home.closes_console());
        assert!(Command::About.closes_console());
        assert!(Command::Goto(1).closes_console());
        assert!(!Command::Help.closes_console());
        assert!(!Command::List.closes_console());
    }

    #[test]
    fn list_enumerates_titles_one_indexed() {
        let panels = vec![
            PanelDescriptor {
                index: 0,
                title: "FLORIS VROEGH".into(),
                caption: String::new(),
                media: "reel".into(),
            },
            PanelDescriptor {
                index: 1,
                title: "RECENT WORK".into(),
                caption: String::new(),
                media: "reel".into(),
            },
        ];
        let lines = list_lines(&panels);
        assert_eq!(lines[1], "1: FLORIS VROEGH");
        assert_eq!(lines[2], "2: RECENT WORK");
    }
}
