use std::fmt;

use chrono::{DateTime, Duration, Utc};
use lifestory_core::model::{CanonicalChapter, ProjectId, QuestionDraft, QuestionId};
use storage::repository::{AnswerRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    project_id: ProjectId,
    per_chapter: usize,
    answers: usize,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidProjectId { raw: String },
    InvalidPerChapter { raw: String },
    InvalidAnswers { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidProjectId { raw } => write!(f, "invalid --project value: {raw}"),
            ArgsError::InvalidPerChapter { raw } => {
                write!(f, "invalid --per-chapter value: {raw}")
            }
            ArgsError::InvalidAnswers { raw } => write!(f, "invalid --answers value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LIFESTORY_DB_URL").unwrap_or_else(|_| "sqlite://lifestory.sqlite3".into());
        let mut project_id = std::env::var("LIFESTORY_PROJECT_ID")
            .ok()
            .and_then(|value| value.parse::<ProjectId>().ok())
            .unwrap_or_else(|| ProjectId::new(1));
        let mut per_chapter = 6;
        let mut answers = 0;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--project" => {
                    let value = require_value(&mut args, "--project")?;
                    project_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidProjectId { raw: value.clone() })?;
                }
                "--per-chapter" => {
                    let value = require_value(&mut args, "--per-chapter")?;
                    per_chapter = value
                        .parse::<usize>()
                        .map_err(|_| ArgsError::InvalidPerChapter { raw: value.clone() })?;
                }
                "--answers" => {
                    let value = require_value(&mut args, "--answers")?;
                    answers = value
                        .parse::<usize>()
                        .map_err(|_| ArgsError::InvalidAnswers { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            project_id,
            per_chapter,
            answers,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://lifestory.sqlite3)");
    eprintln!("  --project <id>            Project to attach sample answers to (default: 1)");
    eprintln!("  --per-chapter <n>         Questions per canonical chapter (default: 6)");
    eprintln!("  --answers <n>             Answer the first n questions of Childhood (default: 0)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LIFESTORY_DB_URL, LIFESTORY_PROJECT_ID");
}

fn prompts(chapter: CanonicalChapter) -> &'static [&'static str] {
    match chapter {
        CanonicalChapter::Childhood => &[
            "Where were you born, and what was the house like?",
            "What is your earliest memory?",
            "Who were your closest friends as a small child?",
            "What games did you play outside?",
            "What did your family eat on special days?",
            "Was there a pet you remember?",
            "What scared you as a child?",
        ],
        CanonicalChapter::ElementarySchool => &[
            "What was your first school called?",
            "Which teacher do you still remember, and why?",
            "How did you get to school each day?",
            "What subject did you love most?",
            "Did you ever get into trouble at school?",
            "What did you do during summer holidays?",
        ],
        CanonicalChapter::TeenageYears => &[
            "What music did you listen to as a teenager?",
            "Who was your first crush?",
            "What did you argue with your parents about?",
            "What was your first job?",
            "What did you want to be when you grew up?",
            "Where did you and your friends hang out?",
        ],
        CanonicalChapter::YoungAdulthood => &[
            "When did you first leave home?",
            "What was your first apartment like?",
            "Did you study after school? What and where?",
            "What was the biggest risk you took in your twenties?",
            "Who taught you the most in those years?",
        ],
        CanonicalChapter::Career => &[
            "How did you choose your line of work?",
            "What was the proudest moment of your career?",
            "Describe a boss or colleague who shaped you.",
            "Was there a job you regret leaving, or taking?",
            "What would you tell someone starting in your field?",
        ],
        CanonicalChapter::LoveAndFamily => &[
            "How did you meet your partner?",
            "What do you remember about your wedding day?",
            "What was it like becoming a parent?",
            "Which family traditions did you keep or start?",
            "What has family taught you?",
        ],
        CanonicalChapter::Midlife => &[
            "What changed for you in your forties and fifties?",
            "Did you move somewhere new in midlife?",
            "Which friendships lasted, and which did not?",
            "What did you learn about yourself in those years?",
        ],
        CanonicalChapter::LaterYears => &[
            "What does a good day look like for you now?",
            "What do you enjoy that you never had time for before?",
            "How has your town changed since you were young?",
            "Who do you spend most of your time with?",
        ],
        CanonicalChapter::Reflections => &[
            "What are you most grateful for?",
            "What would you do differently?",
            "What do you want your grandchildren to know about you?",
            "Which moment would you live again?",
        ],
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut seeded = 0_usize;
    for chapter in CanonicalChapter::ALL {
        for (i, text) in prompts(chapter).iter().take(args.per_chapter).enumerate() {
            let order = i64::try_from(i + 1)?;
            let question = QuestionDraft::new(format!("{}-{:02}", slug(chapter), i + 1), *text)
                .in_chapter(chapter.label())
                .with_order(order)
                .validate()?;
            storage.questions.upsert_question(&question).await?;
            seeded += 1;
        }
    }

    let childhood = slug(CanonicalChapter::Childhood);
    for i in 0..args.answers.min(args.per_chapter) {
        let question_id = QuestionId::new(format!("{childhood}-{:02}", i + 1))
            .ok_or("generated question id is blank")?;
        let recorded_at = now - Duration::days(i64::try_from(args.answers - i)?);
        let answer = AnswerRecord {
            duration_secs: Some(90),
            ..AnswerRecord::new(args.project_id, question_id, recorded_at)
        };
        storage.answers.append_answer(&answer).await?;
    }

    println!(
        "Seeded {seeded} questions and {} answers for project {} into {}",
        args.answers.min(args.per_chapter),
        args.project_id,
        args.db_url
    );

    Ok(())
}

fn slug(chapter: CanonicalChapter) -> String {
    chapter
        .label()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            ' ' => Some('-'),
            _ => None,
        })
        .collect::<String>()
        .replace("--", "-")
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
