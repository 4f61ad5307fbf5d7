use std::process::ExitCode;

use lifestory_core::model::QuestionDraft;
use lifestory_core::navigation::ClickOutcome;
use serde::Serialize;
use services::{AnswerInput, AnswerServiceError, AppServices, Clock};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod render;

use args::{Args, ArgsError, Command, print_usage};

/// Process exit code for a question the user is not allowed to open yet.
const EXIT_REJECTED: u8 = 1;
const EXIT_FAILURE: u8 = 2;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if args.command == Command::Help {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }

    prepare_sqlite_file(&args.db_url)?;
    let app = AppServices::new_sqlite(&args.db_url, Clock::default(), args.settings).await?;
    let project = args.project_id;
    let expand = matches!(args.command, Command::Expand(_));

    match args.command {
        Command::Help => {}
        Command::Progress => {
            let progress = app.progress();
            let views = progress.chapter_views(project).await?;
            let overview = lifestory_core::progress::summarize(&views, progress.settings());
            if args.json {
                #[derive(Serialize)]
                struct Report<'a> {
                    overview: &'a lifestory_core::progress::ProgressOverview,
                    chapters: &'a [lifestory_core::progress::ChapterView],
                }
                print_json(&Report {
                    overview: &overview,
                    chapters: &views,
                })?;
            } else {
                print!("{}", render::progress(&overview, &views));
            }
        }
        Command::Open(question_id) => {
            let outcome = app.progress().click(project, &question_id).await?;
            if args.json {
                print_json(&outcome)?;
            }
            match outcome {
                ClickOutcome::Navigate { question_id } => {
                    if !args.json {
                        println!("open {question_id}");
                    }
                }
                ClickOutcome::Rejected(rejection) => {
                    if !args.json {
                        eprintln!("{rejection}");
                    }
                    return Ok(ExitCode::from(EXIT_REJECTED));
                }
            }
        }
        Command::Answer {
            question_id,
            transcript,
            duration_secs,
        } => {
            let input = AnswerInput {
                duration_secs,
                transcript,
            };
            match app.answers().record_answer(project, &question_id, input).await {
                Ok(record) => {
                    if args.json {
                        print_json(&record)?;
                    } else {
                        println!("recorded answer for {question_id}");
                    }
                }
                Err(err @ (AnswerServiceError::Locked(_) | AnswerServiceError::UnknownQuestion(_))) => {
                    eprintln!("{err}");
                    return Ok(ExitCode::from(EXIT_REJECTED));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Expand(chapter) | Command::Collapse(chapter) => {
            let progress = app.progress();
            let views = progress.chapter_views(project).await?;
            if !views.iter().any(|view| view.name == chapter) {
                eprintln!("no chapter named {chapter}");
                return Ok(ExitCode::from(EXIT_REJECTED));
            }
            progress.set_expanded(project, &chapter, expand).await?;
            info!(chapter = %chapter, expanded = expand, "updated chapter view state");
        }
        Command::Import(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let drafts: Vec<QuestionDraft> = serde_json::from_str(&raw)?;
            let report = app.catalog().import(drafts).await?;
            if args.json {
                print_json(&report)?;
            } else {
                println!(
                    "imported {} question(s), rejected {}",
                    report.imported,
                    report.rejected.len()
                );
                for row in &report.rejected {
                    println!("  row {}: {}", row.position, row.reason);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = match Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
