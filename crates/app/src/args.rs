use std::fmt;
use std::path::PathBuf;

use lifestory_core::model::{ChapterName, ProjectId, QuestionId};
use lifestory_core::progress::{ProgressSettings, ProgressSettingsError};

pub const DEFAULT_DB_URL: &str = "sqlite://lifestory.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { command: &'static str, what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidProjectId { raw: String },
    InvalidQuestionId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidSettings(ProgressSettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { command, what } => {
                write!(f, "{command} requires a {what}")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidProjectId { raw } => write!(f, "invalid --project value: {raw}"),
            ArgsError::InvalidQuestionId { raw } => write!(f, "invalid question id: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSettings(err) => write!(f, "invalid progress settings: {err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Progress,
    Open(QuestionId),
    Answer {
        question_id: QuestionId,
        transcript: Option<String>,
        duration_secs: Option<u32>,
    },
    Expand(ChapterName),
    Collapse(ChapterName),
    Import(PathBuf),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub project_id: ProjectId,
    pub settings: ProgressSettings,
    pub json: bool,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lifestory [options] progress");
    eprintln!("  lifestory [options] open <question-id>");
    eprintln!("  lifestory [options] answer <question-id> [--transcript <text>] [--duration <secs>]");
    eprintln!("  lifestory [options] expand <chapter>");
    eprintln!("  lifestory [options] collapse <chapter>");
    eprintln!("  lifestory [options] import <questions.json>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>       SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --project <id>          Project id (default: 1)");
    eprintln!("  --unlock-window <n>     Available questions per chapter (default: 5)");
    eprintln!("  --max-today <n>         Questions listed as today's focus (default: 5)");
    eprintln!("  --threshold <n>         Answers needed to open the next chapter (default: 5)");
    eprintln!("  --json                  Print JSON instead of text");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LIFESTORY_DB_URL, LIFESTORY_PROJECT_ID, LIFESTORY_UNLOCK_WINDOW,");
    eprintln!("  LIFESTORY_MAX_TODAY, LIFESTORY_NEXT_CHAPTER_THRESHOLD, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn env_number(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    flag: &'static str,
    default: usize,
) -> Result<usize, ArgsError> {
    env(key).map_or(Ok(default), |raw| parse_number(flag, raw))
}

fn question_operand(
    command: &'static str,
    operands: &mut impl Iterator<Item = String>,
) -> Result<QuestionId, ArgsError> {
    let raw = operands.next().ok_or(ArgsError::MissingOperand {
        command,
        what: "question id",
    })?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidQuestionId { raw: raw.clone() })
}

fn chapter_operand(
    command: &'static str,
    operands: impl Iterator<Item = String>,
) -> Result<ChapterName, ArgsError> {
    let label = operands.collect::<Vec<_>>().join(" ");
    if label.trim().is_empty() {
        return Err(ArgsError::MissingOperand {
            command,
            what: "chapter name",
        });
    }
    Ok(ChapterName::parse(Some(&label)))
}

/// Normalize a `SQLite` URL so relative paths resolve against the working directory.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

impl Args {
    /// Parse command-line arguments, falling back to `env` for unset options.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("LIFESTORY_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut project_id = match env("LIFESTORY_PROJECT_ID") {
            Some(raw) => raw
                .parse::<ProjectId>()
                .map_err(|_| ArgsError::InvalidProjectId { raw })?,
            None => ProjectId::new(1),
        };
        let mut unlock_window = env_number(
            &env,
            "LIFESTORY_UNLOCK_WINDOW",
            "--unlock-window",
            ProgressSettings::DEFAULT_UNLOCK_WINDOW,
        )?;
        let mut max_today = env_number(
            &env,
            "LIFESTORY_MAX_TODAY",
            "--max-today",
            ProgressSettings::DEFAULT_MAX_VISIBLE_AVAILABLE,
        )?;
        let mut threshold = env_number(
            &env,
            "LIFESTORY_NEXT_CHAPTER_THRESHOLD",
            "--threshold",
            ProgressSettings::DEFAULT_NEXT_CHAPTER_THRESHOLD,
        )?;
        let mut json = false;
        let mut transcript = None;
        let mut duration_secs = None;
        let mut positional = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--project" => {
                    let value = require_value(&mut args, "--project")?;
                    project_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidProjectId { raw: value.clone() })?;
                }
                "--unlock-window" => {
                    unlock_window =
                        parse_number("--unlock-window", require_value(&mut args, "--unlock-window")?)?;
                }
                "--max-today" => {
                    max_today = parse_number("--max-today", require_value(&mut args, "--max-today")?)?;
                }
                "--threshold" => {
                    threshold = parse_number("--threshold", require_value(&mut args, "--threshold")?)?;
                }
                "--transcript" => {
                    transcript = Some(require_value(&mut args, "--transcript")?);
                }
                "--duration" => {
                    duration_secs =
                        Some(parse_number("--duration", require_value(&mut args, "--duration")?)?);
                }
                "--json" => json = true,
                "--help" | "-h" => positional = vec!["help".to_string()],
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let settings = ProgressSettings::new(unlock_window, max_today, threshold)
            .map_err(ArgsError::InvalidSettings)?;

        let mut operands = positional.into_iter();
        let command = match operands.next().as_deref() {
            None | Some("progress") => Command::Progress,
            Some("help") => Command::Help,
            Some("open") => Command::Open(question_operand("open", &mut operands)?),
            Some("answer") => Command::Answer {
                question_id: question_operand("answer", &mut operands)?,
                transcript,
                duration_secs,
            },
            Some("expand") => Command::Expand(chapter_operand("expand", &mut operands)?),
            Some("collapse") => Command::Collapse(chapter_operand("collapse", &mut operands)?),
            Some("import") => Command::Import(PathBuf::from(operands.next().ok_or(
                ArgsError::MissingOperand {
                    command: "import",
                    what: "file path",
                },
            )?)),
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        if let Some(extra) = operands.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self {
            db_url,
            project_id,
            settings,
            json,
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifestory_core::model::CanonicalChapter;
    use std::collections::HashMap;

    fn parse(argv: &[&str], env: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Args::parse(argv.iter().map(|s| (*s).to_string()), move |key| {
            env.get(key).cloned()
        })
    }

    #[test]
    fn defaults_to_progress_with_default_settings() {
        let args = parse(&[], &[]).unwrap();
        assert_eq!(args.command, Command::Progress);
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert_eq!(args.project_id, ProjectId::new(1));
        assert_eq!(args.settings, ProgressSettings::default());
        assert!(!args.json);
    }

    #[test]
    fn flags_override_environment() {
        let args = parse(
            &["--threshold", "3", "--project", "9", "progress"],
            &[
                ("LIFESTORY_NEXT_CHAPTER_THRESHOLD", "7"),
                ("LIFESTORY_UNLOCK_WINDOW", "2"),
                ("LIFESTORY_PROJECT_ID", "4"),
            ],
        )
        .unwrap();
        assert_eq!(args.settings.next_chapter_threshold(), 3);
        assert_eq!(args.settings.unlock_window(), 2);
        assert_eq!(args.project_id, ProjectId::new(9));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = parse(&["--unlock-window", "0"], &[]).unwrap_err();
        assert!(matches!(
            err,
            ArgsError::InvalidSettings(ProgressSettingsError::InvalidUnlockWindow)
        ));
    }

    #[test]
    fn answer_collects_optional_metadata() {
        let args = parse(
            &["answer", "childhood-01", "--transcript", "By the river", "--duration", "75"],
            &[],
        )
        .unwrap();
        assert_eq!(
            args.command,
            Command::Answer {
                question_id: QuestionId::new("childhood-01").unwrap(),
                transcript: Some("By the river".into()),
                duration_secs: Some(75),
            }
        );
    }

    #[test]
    fn expand_joins_multi_word_chapters() {
        let args = parse(&["expand", "Love", "&", "Family"], &[]).unwrap();
        assert_eq!(
            args.command,
            Command::Expand(ChapterName::Canonical(CanonicalChapter::LoveAndFamily))
        );
    }

    #[test]
    fn operands_are_required() {
        assert!(matches!(
            parse(&["open"], &[]).unwrap_err(),
            ArgsError::MissingOperand { command: "open", .. }
        ));
        assert!(matches!(
            parse(&["frobnicate"], &[]).unwrap_err(),
            ArgsError::UnknownCommand(_)
        ));
        assert!(matches!(
            parse(&["--bogus"], &[]).unwrap_err(),
            ArgsError::UnknownArg(_)
        ));
    }
}
