//! Turns raw user input (console lines, numeric fields, drag-and-drop
//! payloads) into [`ControlCommand`]s.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::events::ControlCommand;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a valid index")]
    InvalidIndex(String),
    #[error("`{input}` is not a valid {kind}")]
    InvalidTime { kind: NumericKind, input: String },
    #[error("`{0}` is not on or off")]
    InvalidToggle(String),
}

/// The two numeric settings a user can type in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// Whole seconds, strictly positive.
    Delay,
    /// Seconds, fractional allowed, zero allowed.
    Animation,
}

impl std::fmt::Display for NumericKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericKind::Delay => f.write_str("slide delay (whole seconds > 0)"),
            NumericKind::Animation => f.write_str("animation duration (seconds >= 0)"),
        }
    }
}

pub fn parse_numeric_value(kind: NumericKind, text: &str) -> Result<Duration, InputError> {
    let text = text.trim();
    let invalid = || InputError::InvalidTime {
        kind,
        input: text.to_string(),
    };
    match kind {
        NumericKind::Delay => match text.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(invalid()),
        },
        NumericKind::Animation => match text.parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                Duration::try_from_secs_f64(secs).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        },
    }
}

/// Parses one console line.
///
/// ```text
/// next | prev | show N | remove N | clear | start | pause
/// add PATH... | url URL | drop PATH...|URL | delay SECS | anim SECS
/// fit on|off | resize on|off
/// ```
pub fn parse_console_command(line: &str) -> Result<ControlCommand, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(InputError::Empty);
    };
    let verb = verb.to_ascii_lowercase();
    let mut arg = |name: &'static str| words.next().ok_or(InputError::MissingArgument(name));

    let command = match verb.as_str() {
        "next" | "n" => ControlCommand::Next,
        "prev" | "previous" | "p" => ControlCommand::Previous,
        "clear" => ControlCommand::Clear,
        "start" | "play" => ControlCommand::Start,
        "pause" | "stop" => ControlCommand::Pause,
        "show" => ControlCommand::Show(parse_index(arg("show")?)?),
        "remove" | "rm" => ControlCommand::Remove(parse_index(arg("remove")?)?),
        "url" => ControlCommand::AddUrl(arg("url")?.to_string()),
        "delay" => ControlCommand::SetDelay(parse_numeric_value(
            NumericKind::Delay,
            arg("delay")?,
        )?),
        "anim" | "animation" => ControlCommand::SetAnimationDuration(parse_numeric_value(
            NumericKind::Animation,
            arg("anim")?,
        )?),
        "fit" => ControlCommand::SetFitToWindow(parse_toggle(arg("fit")?)?),
        "resize" => ControlCommand::SetResizeWindowToImage(parse_toggle(arg("resize")?)?),
        "drop" => DropPayload::from_console(words.collect())?.into_command(),
        "add" => {
            let paths: Vec<String> = words.map(str::to_string).collect();
            if paths.is_empty() {
                return Err(InputError::MissingArgument("add"));
            }
            ControlCommand::AddFiles(paths)
        }
        _ => return Err(InputError::Unknown(verb)),
    };
    Ok(command)
}

fn parse_index(text: &str) -> Result<usize, InputError> {
    text.parse().map_err(|_| InputError::InvalidIndex(text.to_string()))
}

fn parse_toggle(text: &str) -> Result<bool, InputError> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(InputError::InvalidToggle(text.to_string())),
    }
}

/// Something dropped onto the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    Files(Vec<PathBuf>),
    /// Dragged text is taken to be an image address.
    Text(String),
}

impl DropPayload {
    /// A console `drop`: a lone address is dropped text, anything else a
    /// set of files.
    fn from_console(items: Vec<&str>) -> Result<Self, InputError> {
        match items.as_slice() {
            [] => Err(InputError::MissingArgument("drop")),
            [text] if is_remote(text) => Ok(DropPayload::Text(text.to_string())),
            paths => Ok(DropPayload::Files(paths.iter().map(PathBuf::from).collect())),
        }
    }

    pub fn into_command(self) -> ControlCommand {
        match self {
            DropPayload::Files(paths) => ControlCommand::AddFiles(
                paths
                    .into_iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            ),
            DropPayload::Text(text) => ControlCommand::AddUrl(text.trim().to_string()),
        }
    }
}

/// Command for a source named on the command line: anything with a URL
/// scheme other than `file` is fetched, the rest is treated as a path.
pub fn command_for_source(source: &str) -> ControlCommand {
    if is_remote(source) {
        ControlCommand::AddUrl(source.to_string())
    } else {
        ControlCommand::AddFiles(vec![source.to_string()])
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.contains("://") && !lower.starts_with("file://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_must_be_positive_whole_seconds() {
        assert_eq!(
            parse_numeric_value(NumericKind::Delay, " 7 "),
            Ok(Duration::from_secs(7))
        );
        for bad in ["0", "-3", "1.5", "abc", ""] {
            assert!(
                matches!(
                    parse_numeric_value(NumericKind::Delay, bad),
                    Err(InputError::InvalidTime { kind: NumericKind::Delay, .. })
                ),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn animation_accepts_fractions_and_zero() {
        assert_eq!(
            parse_numeric_value(NumericKind::Animation, "0.25"),
            Ok(Duration::from_millis(250))
        );
        assert_eq!(
            parse_numeric_value(NumericKind::Animation, "0"),
            Ok(Duration::ZERO)
        );
        for bad in ["-0.5", "NaN", "inf", "fast"] {
            assert!(
                parse_numeric_value(NumericKind::Animation, bad).is_err(),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn console_commands() {
        use ControlCommand::*;
        let cases = [
            ("next", Next),
            ("  PREV ", Previous),
            ("show 3", Show(3)),
            ("rm 0", Remove(0)),
            ("clear", Clear),
            ("start", Start),
            ("pause", Pause),
            ("delay 4", SetDelay(Duration::from_secs(4))),
            ("anim 0.5", SetAnimationDuration(Duration::from_millis(500))),
            ("fit on", SetFitToWindow(true)),
            ("resize off", SetResizeWindowToImage(false)),
            ("url http://h.example/a.png", AddUrl("http://h.example/a.png".into())),
            ("add a.png b.jpg", AddFiles(vec!["a.png".into(), "b.jpg".into()])),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_console_command(line), Ok(expected), "{line:?}");
        }
    }

    #[test]
    fn console_errors() {
        assert_eq!(parse_console_command("   "), Err(InputError::Empty));
        assert_eq!(
            parse_console_command("jump 2"),
            Err(InputError::Unknown("jump".into()))
        );
        assert_eq!(
            parse_console_command("show"),
            Err(InputError::MissingArgument("show"))
        );
        assert_eq!(
            parse_console_command("add"),
            Err(InputError::MissingArgument("add"))
        );
        assert_eq!(
            parse_console_command("remove -1"),
            Err(InputError::InvalidIndex("-1".into()))
        );
        assert_eq!(
            parse_console_command("fit maybe"),
            Err(InputError::InvalidToggle("maybe".into()))
        );
        assert!(matches!(
            parse_console_command("delay 0"),
            Err(InputError::InvalidTime { .. })
        ));
    }

    #[test]
    fn drops_become_add_commands() {
        let files = DropPayload::Files(vec![
            PathBuf::from("/pics/a.png"),
            PathBuf::from("/pics"),
        ]);
        assert_eq!(
            files.into_command(),
            ControlCommand::AddFiles(vec!["/pics/a.png".into(), "/pics".into()])
        );
        let text = DropPayload::Text(" https://h.example/a.png\n".into());
        assert_eq!(
            text.into_command(),
            ControlCommand::AddUrl("https://h.example/a.png".into())
        );
    }

    #[test]
    fn console_drop_verb() {
        assert_eq!(
            parse_console_command("drop https://h.example/a.png"),
            Ok(ControlCommand::AddUrl("https://h.example/a.png".into()))
        );
        assert_eq!(
            parse_console_command("drop /pics a.png"),
            Ok(ControlCommand::AddFiles(vec!["/pics".into(), "a.png".into()]))
        );
        assert_eq!(
            parse_console_command("drop file:///pics/a.png"),
            Ok(ControlCommand::AddFiles(vec!["file:///pics/a.png".into()]))
        );
        assert_eq!(
            parse_console_command("drop"),
            Err(InputError::MissingArgument("drop"))
        );
    }

    #[test]
    fn sources_with_schemes_are_fetched() {
        assert_eq!(
            command_for_source("https://h.example/a.png"),
            ControlCommand::AddUrl("https://h.example/a.png".into())
        );
        assert_eq!(
            command_for_source("ftp://h.example/a.png"),
            ControlCommand::AddUrl("ftp://h.example/a.png".into())
        );
        assert_eq!(
            command_for_source("file:///pics/a.png"),
            ControlCommand::AddFiles(vec!["file:///pics/a.png".into()])
        );
        assert_eq!(
            command_for_source("pics/a.png"),
            ControlCommand::AddFiles(vec!["pics/a.png".into()])
        );
    }
}
