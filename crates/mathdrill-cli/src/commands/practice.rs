//! The `mathdrill practice` command.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use mathdrill_core::transcript::SessionTranscript;
use mathdrill_core::{Difficulty, ScoreBoard, SessionController, SessionView};
use mathdrill_providers::config::{load_config_from, provider_from_config};

use crate::terminal::TerminalView;

const HELP: &str = "\
Commands:
  :easy | :medium | :hard   select difficulty
  :difficulty <level>       select difficulty by name
  :new  (:n)                request a new problem
  :score                    show score and accuracy
  :help                     show this help
  :quit (:q)                end the session
Anything else is submitted as your answer.";

/// One line of user input, mapped to a UI event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    SelectDifficulty(Difficulty),
    NewProblem,
    Score,
    Help,
    Quit,
    Answer(String),
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix(':') else {
            return Input::Answer(line.to_string());
        };
        let mut words = command.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        match name.as_str() {
            "new" | "n" => Input::NewProblem,
            "score" | "s" => Input::Score,
            "help" | "h" | "?" => Input::Help,
            "quit" | "q" | "exit" => Input::Quit,
            "difficulty" | "d" => match words.next().map(str::parse::<Difficulty>) {
                Some(Ok(d)) => Input::SelectDifficulty(d),
                _ => Input::Unknown(trimmed.to_string()),
            },
            other => match other.parse::<Difficulty>() {
                Ok(d) => Input::SelectDifficulty(d),
                Err(_) => Input::Unknown(trimmed.to_string()),
            },
        }
    }
}

pub async fn execute(
    difficulty: Option<Difficulty>,
    provider_name: Option<String>,
    model: Option<String>,
    config_path: Option<PathBuf>,
    transcript_dir: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = provider_from_config(&config, provider_name.as_deref())?;
    let mut controller =
        SessionController::new(provider, config.controller_config(model, difficulty));

    tracing::info!(
        session = %controller.session_id(),
        provider = controller.provider_name(),
        model = controller.model(),
        "practice session started"
    );

    let mut view = TerminalView::new(std::io::stdout());
    view.line(&format!(
        "mathdrill v{} ({} / {})",
        env!("CARGO_PKG_VERSION"),
        controller.provider_name(),
        controller.model()
    ));
    view.line("Type :new for a problem, :help for commands.");

    let input = BufReader::new(tokio::io::stdin());
    run_session(&mut controller, &mut view, input).await?;

    print_summary(&mut view, &controller);

    if let Some(dir) = transcript_dir {
        let path = save_transcript(&controller, &dir)?;
        view.line(&format!("Transcript saved to: {}", path.display()));
    }

    Ok(())
}

/// Feed input lines to the controller until `:quit` or end of input.
pub async fn run_session<R, W>(
    controller: &mut SessionController,
    view: &mut TerminalView<W>,
    mut input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    controller.render(view);

    loop {
        view.prompt();
        let Some(line) = read_line_lossy(&mut input).await? else {
            view.line("");
            break;
        };

        match Input::parse(&line) {
            Input::SelectDifficulty(d) => controller.select_difficulty(d, view),
            Input::NewProblem => {
                controller.request_problem(view).await;
            }
            Input::Score => view.show_score(controller.score()),
            Input::Help => view.line(HELP),
            Input::Quit => break,
            // A bare Enter only counts as a submission while answering.
            Input::Answer(answer) if answer.trim().is_empty() && !view.answer_entry_visible() => {}
            Input::Answer(answer) => {
                controller.evaluate_answer(&answer, view).await;
            }
            Input::Unknown(cmd) => view.line(&format!("Unknown command {cmd}, try :help")),
        }
    }

    Ok(())
}

/// Read one line, replacing invalid UTF-8 instead of failing the session.
async fn read_line_lossy<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn print_summary<W: Write>(view: &mut TerminalView<W>, controller: &SessionController) {
    let mut table = Table::new();
    table.set_header(vec!["Difficulty", "Answered", "Correct", "Accuracy"]);

    let history = controller.history();
    for difficulty in Difficulty::ALL {
        let mut board = ScoreBoard::default();
        for cycle in history.iter().filter(|c| c.difficulty == difficulty) {
            board.record(cycle.is_correct);
        }
        if board.total == 0 {
            continue;
        }
        table.add_row(vec![
            Cell::new(difficulty),
            Cell::new(board.total),
            Cell::new(board.correct),
            Cell::new(board.accuracy_display()),
        ]);
    }

    let score = controller.score();
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(score.total),
        Cell::new(score.correct),
        Cell::new(score.accuracy_display()),
    ]);

    view.line("");
    view.line(&table.to_string());
    view.line(&format!("Final score: {}", score.display()));
}

fn save_transcript(controller: &SessionController, dir: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = dir.join(format!("session-{timestamp}.json"));
    SessionTranscript::from_controller(controller).save_json(&path)?;
    Ok(path)
}
