//! Line-oriented study loop.

use std::str::FromStr;

use kioku_core::gesture::SwipeTracker;
use kioku_core::model::{CategoryFilter, QuestionId, StatusFilter, SubjectId};
use services::{AppServices, Direction, MarkOutcome, StudySession, ViewMode};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::AppError;

/// Simulated swipes start mid-screen on a viewport this wide.
const SWIPE_VIEWPORT: f64 = 400.0;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Subjects,
    Select(SubjectId),
    Leave,
    Show,
    List,
    Next,
    Prev,
    Flip,
    Known,
    Failed,
    Swipe(f64),
    Cycle(QuestionId),
    Categories,
    Category(CategoryFilter),
    Status(StatusFilter),
    Clear,
    Shuffle,
    Stats,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("{0} requires an argument")]
    MissingArgument(&'static str),
    #[error("invalid argument for {command}: {raw}")]
    InvalidArgument { command: &'static str, raw: String },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));

        let arg = |command: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(command))
            } else {
                Ok(rest)
            }
        };
        let invalid = |command: &'static str| CommandError::InvalidArgument {
            command,
            raw: rest.to_string(),
        };

        Ok(match name {
            "subjects" | "ls" => Command::Subjects,
            "select" | "open" => Command::Select(
                arg("select")?
                    .parse()
                    .map_err(|_| invalid("select"))?,
            ),
            "leave" | "back" => Command::Leave,
            "show" | "card" | "" => Command::Show,
            "list" => Command::List,
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "flip" | "f" => Command::Flip,
            "known" | "k" => Command::Known,
            "failed" | "x" => Command::Failed,
            "swipe" => Command::Swipe(arg("swipe")?.parse().map_err(|_| invalid("swipe"))?),
            "cycle" => Command::Cycle(arg("cycle")?.parse().map_err(|_| invalid("cycle"))?),
            "categories" => Command::Categories,
            "category" | "cat" => Command::Category(
                arg("category")?
                    .parse()
                    .map_err(|_| invalid("category"))?,
            ),
            "status" => Command::Status(arg("status")?.parse().map_err(|_| invalid("status"))?),
            "clear" => Command::Clear,
            "shuffle" => Command::Shuffle,
            "stats" => Command::Stats,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        })
    }
}

fn print_help() {
    println!("Subjects:  subjects | select <id> | leave");
    println!("Study:     show | flip | known | failed | next | prev | swipe <dx>");
    println!("Filters:   categories | category <name|All> | status <all|unseen|failed|learned> | clear");
    println!("Other:     list | cycle <question id> | shuffle | stats | reset | help | quit");
}

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>, AppError> {
    use std::io::Write as _;
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

/// Runs until `quit` or end of input.
///
/// # Errors
///
/// Returns `AppError` if stdin fails or a subject cannot be opened. Failed
/// progress writes are reported and the loop continues.
pub(crate) async fn run(services: &AppServices) -> Result<(), AppError> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut session = services.restore_session().await?;

    match &session {
        Some(session) => {
            println!("Resuming {}.", session.subject().name());
            show(session);
        }
        None => print_subjects(services),
    }

    loop {
        let label = session
            .as_ref()
            .map_or_else(|| "kioku> ".to_string(), |s| format!("{}> ", s.subject_id()));
        let Some(line) = prompt(&mut input, &label).await? else {
            break;
        };
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Subjects => print_subjects(services),
            Command::Select(id) => {
                if let Some(current) = session.take() {
                    services.close_subject(current).await?;
                }
                match services.open_subject(&id).await {
                    Ok(opened) => {
                        show(&opened);
                        session = Some(opened);
                    }
                    Err(services::SessionError::UnknownSubject(id)) => {
                        println!("No subject named {id}.");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Command::Leave => {
                if let Some(current) = session.take() {
                    services.close_subject(current).await?;
                }
                print_subjects(services);
            }
            command => match session.as_mut() {
                Some(active) => match study(active, command, &mut input).await {
                    Err(AppError::Session(err)) => println!("Not saved: {err}"),
                    other => other?,
                },
                None => println!("Pick a subject first (`subjects`, then `select <id>`)."),
            },
        }
    }
    Ok(())
}

async fn study(
    session: &mut StudySession,
    command: Command,
    input: &mut Input,
) -> Result<(), AppError> {
    match command {
        Command::Show => {
            session.set_view(ViewMode::Card);
            show(session);
        }
        Command::List => {
            session.set_view(ViewMode::List);
            show(session);
        }
        Command::Next | Command::Prev => {
            let direction = if command == Command::Next {
                Direction::Next
            } else {
                Direction::Prev
            };
            if session.advance(direction) {
                show(session);
            } else {
                print_empty(session);
            }
        }
        Command::Flip => {
            session.toggle_reveal();
            show(session);
        }
        Command::Known | Command::Failed => {
            let outcome = if command == Command::Known {
                session.mark_known().await?
            } else {
                session.mark_failed().await?
            };
            settle(session, outcome).await?;
        }
        Command::Swipe(dx) => {
            let start = SWIPE_VIEWPORT / 2.0;
            let Some(mut tracker) = SwipeTracker::begin(start, SWIPE_VIEWPORT) else {
                return Ok(());
            };
            tracker.drag_to(start + dx);
            let outcome = session.apply_swipe(tracker.finish()).await?;
            settle(session, outcome).await?;
        }
        Command::Cycle(id) => match session.cycle_status(id).await {
            Ok(status) => println!("Question {id} is now {status:?}."),
            Err(services::SessionError::UnknownQuestion(id)) => {
                println!("Question {id} is not part of this subject.");
            }
            Err(err) => return Err(err.into()),
        },
        Command::Categories => {
            println!("All");
            for category in session.categories() {
                println!("{category}");
            }
        }
        Command::Category(category) => {
            session.set_category(category);
            print_filters(session);
            show(session);
        }
        Command::Status(status) => {
            session.set_status_filter(status);
            print_filters(session);
            show(session);
        }
        Command::Clear => {
            session.clear_filters();
            show(session);
        }
        Command::Shuffle => {
            session.shuffle();
            println!("Shuffled.");
            show(session);
        }
        Command::Stats => print_filters(session),
        Command::Reset => {
            let request = session.request_reset();
            let question = format!(
                "Reset all progress for {}? This cannot be undone. [y/N] ",
                session.subject().name()
            );
            let answer = prompt(input, &question).await?.unwrap_or_default();
            if answer.trim().eq_ignore_ascii_case("y") {
                session.confirm_reset(request).await?;
                println!("Progress reset.");
                show(session);
            } else {
                println!("Cancelled.");
            }
        }
        Command::Subjects
        | Command::Select(_)
        | Command::Leave
        | Command::Help
        | Command::Quit => {}
    }
    Ok(())
}

/// Shows the revealed answer for the configured delay, then applies the mark.
async fn settle(session: &mut StudySession, outcome: MarkOutcome) -> Result<(), AppError> {
    match outcome {
        MarkOutcome::NoCard => print_empty(session),
        MarkOutcome::Cancelled => println!("Swipe cancelled."),
        MarkOutcome::Committed(_) => show(session),
        MarkOutcome::Deferred { .. } => {
            show(session);
            if let Some(wait) = session.time_until_pending() {
                tokio::time::sleep(wait).await;
            }
            if session.tick().await?.is_none() && session.pending().is_some() {
                session.flush_pending().await?;
            }
            show(session);
        }
    }
    Ok(())
}

fn print_subjects(services: &AppServices) {
    let catalog = services.catalog();
    if catalog.is_empty() {
        println!("No subjects found.");
        return;
    }
    println!("Subjects:");
    for subject in catalog.subjects() {
        println!(
            "  {:<12} {} ({} questions)",
            subject.id(),
            subject.name(),
            catalog.total_questions(subject.id()).unwrap_or_default()
        );
    }
}

fn print_filters(session: &StudySession) {
    let counts = session.counts();
    let selection = session.selection();
    println!(
        "[{} / {}] all {} | unseen {} | failed {} | learned {} | {}% learned",
        selection.category(),
        selection.status(),
        counts.total,
        counts.unseen,
        counts.failed,
        counts.learned,
        session.progress_percent()
    );
}

fn print_empty(session: &StudySession) {
    if let Some(state) = session.empty_state() {
        println!("{}", state.title());
        println!("{}", state.message());
    }
}

fn show(session: &StudySession) {
    if session.empty_state().is_some() {
        print_empty(session);
        return;
    }
    match session.selection().view() {
        ViewMode::Card => {
            if let Some(card) = session.current_card() {
                println!(
                    "({}) {}  [{:?}]",
                    card.counter(),
                    card.question.category(),
                    card.status
                );
                println!("{}", card.face.render());
            }
        }
        ViewMode::List => {
            for row in session.list_rows() {
                println!(
                    "{:>5}  {:<9} {}",
                    row.question.id(),
                    format!("{:?}", row.status),
                    row.question.question()
                );
                println!("       {}", row.question.answer());
            }
        }
    }
}
