use std::fmt;
use std::path::{Path, PathBuf};

use lesson_core::Clock;
use lesson_core::gatekeeper::Advance;
use lesson_core::model::{AudioPreference, Module, StudentId};
use serde::de::DeserializeOwned;
use services::{CompletionEvent, ModuleLoopService, ModuleSession, SessionError};
use storage::repository::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod script;

use script::{Action, Script};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidStudentId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidStudentId { raw } => write!(f, "invalid --student value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            LoadError::Json { path, source } => {
                write!(f, "invalid JSON in {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Json { source, .. } => Some(source),
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- walk  --module <file> --script <file> [--db <sqlite_url>] [--student <id>]");
    eprintln!("  cargo run -p app -- check --module <file>");
    eprintln!();
    eprintln!("Without --db the walk runs against in-memory collaborators.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSON_DB_URL, LESSON_STUDENT_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Walk,
    Check,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "walk" => Some(Self::Walk),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct WalkArgs {
    module: PathBuf,
    script: PathBuf,
    db_url: Option<String>,
    student_id: StudentId,
}

#[derive(Debug, PartialEq, Eq)]
struct CheckArgs {
    module: PathBuf,
}

fn parse_student(raw: String) -> Result<StudentId, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidStudentId { raw })
}

impl WalkArgs {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env_db: Option<String>,
        env_student: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut module = None;
        let mut script = None;
        let mut db_url = env_db
            .filter(|value| !value.trim().is_empty())
            .map(normalize_sqlite_url);
        let mut student_id = match env_student {
            Some(raw) => parse_student(raw)?,
            None => StudentId::new("local-learner"),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--module" => module = Some(PathBuf::from(require_value(args, "--module")?)),
                "--script" => script = Some(PathBuf::from(require_value(args, "--script")?)),
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--student" => student_id = parse_student(require_value(args, "--student")?)?,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            module: module.ok_or(ArgsError::MissingFlag { flag: "--module" })?,
            script: script.ok_or(ArgsError::MissingFlag { flag: "--script" })?,
            db_url,
            student_id,
        })
    }
}

impl CheckArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut module = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--module" => module = Some(PathBuf::from(require_value(args, "--module")?)),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Self {
            module: module.ok_or(ArgsError::MissingFlag { flag: "--module" })?,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

    let path = Path::new(path);
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

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

fn run_check(args: &CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let module: Module = load_json(&args.module)?;
    println!("{} ({})", module.title(), module.id());
    for (index, section) in module.sections().iter().enumerate() {
        let questions = module.questions_for(section).map_or(0, <[_]>::len);
        let mut tags = Vec::new();
        if section.is_pre_test() {
            tags.push("pre-test");
        }
        if section.is_post_test() {
            tags.push("post-test");
        }
        if section.carries_audio() {
            tags.push("audio");
        }
        if !section.is_required() {
            tags.push("optional");
        }
        println!(
            "  {index:>2}. {:<24} {:<12} questions={questions} {}",
            section.id().as_str(),
            section.content_type().as_str(),
            tags.join(",")
        );
    }
    Ok(())
}

async fn run_walk(args: WalkArgs) -> Result<(), Box<dyn std::error::Error>> {
    let module: Module = load_json(&args.module)?;
    let script: Script = load_json(&args.script)?;

    // Keep storage bootstrapping in the binary glue so core/services stay pure.
    let storage = match &args.db_url {
        Some(url) => {
            prepare_sqlite_file(url)?;
            Storage::sqlite(url).await?
        }
        None => Storage::in_memory(),
    };
    let svc = ModuleLoopService::from_storage(Clock::system(), &storage);

    if let Some(previous) = svc
        .previous_completion(&args.student_id, module.id())
        .await?
    {
        info!(
            final_score = previous.final_score,
            badge = previous.badge_tier.as_str(),
            "previous completion on record"
        );
    }

    let mut session = svc.start_session(args.student_id, module, script.learning_styles);
    let mut completion = None;
    for (n, action) in script.steps.into_iter().enumerate() {
        match apply(&svc, &mut session, action).await {
            Ok(Some(event)) => completion = Some(event),
            Ok(None) => {}
            Err(err) => eprintln!("step {}: {err}", n + 1),
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.progress())?);
    match completion {
        Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
        None => println!("module not completed"),
    }
    Ok(())
}

async fn apply(
    svc: &ModuleLoopService,
    session: &mut ModuleSession,
    action: Action,
) -> Result<Option<CompletionEvent>, SessionError> {
    match action {
        Action::Complete { section } => svc.mark_section_complete(session, &section).await,
        Action::Answer {
            section,
            index,
            value,
        } => {
            session.record_answer(&section, index, value)?;
            Ok(None)
        }
        Action::Draft { section } => {
            let saved = svc.save_draft(session, &section).await?;
            println!(
                "draft {section}: {}",
                if saved { "saved" } else { "kept locally" }
            );
            Ok(None)
        }
        Action::Submit { section } => {
            let outcome = svc.submit_assessment(session, &section).await?;
            println!(
                "submitted {section}: {:.1}% ({})",
                outcome.result.percentage,
                if outcome.result.passed { "passed" } else { "not passed" }
            );
            Ok(outcome.completion)
        }
        Action::Next => {
            let step = svc.advance(session).await?;
            describe(&step.advance, session);
            Ok(step.completion)
        }
        Action::Previous => {
            let index = svc.retreat(session);
            println!("back to section {index}");
            Ok(None)
        }
        Action::Prefer { choice } => {
            let choice = AudioPreference::parse_choice(&choice)?;
            if let Some(token) = session.pending_prompt().cloned() {
                let step = svc.resume_with_preference(session, &token, choice).await?;
                describe(&step.advance, session);
                Ok(step.completion)
            } else {
                svc.choose_audio_preference(session, choice).await
            }
        }
        Action::RetryCompletion => svc.retry_completion(session).await.map(Some),
    }
}

fn describe(advance: &Advance, session: &ModuleSession) {
    match advance {
        Advance::Moved { to, .. } => {
            let title = session.current_section().map_or("?", |s| s.title());
            println!("now on {to}: {title}");
        }
        Advance::Blocked(reason) => println!("blocked: {reason}"),
        Advance::NeedsPreference(token) => {
            println!("choose audio or read_aloud before {}", token.target());
        }
        Advance::Completed => println!("module complete"),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    match cmd {
        Command::Walk => {
            let parsed = WalkArgs::parse(
                &mut iter,
                std::env::var("LESSON_DB_URL").ok(),
                std::env::var("LESSON_STUDENT_ID").ok(),
            )
            .inspect_err(|e| {
                eprintln!("{e}");
                print_usage();
            })?;
            run_walk(parsed).await
        }
        Command::Check => {
            let parsed = CheckArgs::parse(&mut iter).inspect_err(|e| {
                eprintln!("{e}");
                print_usage();
            })?;
            run_check(&parsed)
        }
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn walk_flags_override_environment() {
        let parsed = WalkArgs::parse(
            &mut args(&["--module", "m.json", "--script", "s.json", "--student", "ada"]),
            Some("sqlite::memory:".into()),
            Some("env-learner".into()),
        )
        .unwrap();
        assert_eq!(parsed.module, PathBuf::from("m.json"));
        assert_eq!(parsed.db_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(parsed.student_id, StudentId::new("ada"));
    }

    #[test]
    fn walk_requires_module_and_script() {
        let err = WalkArgs::parse(&mut args(&["--module", "m.json"]), None, None).unwrap_err();
        assert!(matches!(err, ArgsError::MissingFlag { flag: "--script" }));

        let err = WalkArgs::parse(&mut args(&["--module"]), None, None).unwrap_err();
        assert!(matches!(err, ArgsError::MissingValue { flag: "--module" }));
    }

    #[test]
    fn blank_student_is_rejected() {
        let err = WalkArgs::parse(
            &mut args(&["--module", "m", "--script", "s", "--student", "  "]),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ArgsError::InvalidStudentId { .. }));
    }

    #[test]
    fn check_rejects_unknown_flags() {
        let err = CheckArgs::parse(&mut args(&["--module", "m", "--verbose"])).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownArg(arg) if arg == "--verbose"));
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/lessons.db".into()),
            "sqlite:///tmp/lessons.db"
        );
        assert!(normalize_sqlite_url("sqlite:lessons.db".into()).starts_with("sqlite:///"));
    }
}
