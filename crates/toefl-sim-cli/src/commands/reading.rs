//! The `toefl-sim reading` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use toefl_sim_core::model::{QuestionType, ReadingOptions};
use toefl_sim_core::practice::{ReadingReport, Trainer};
use toefl_sim_core::session::SessionState;
use toefl_sim_core::timer::format_clock;
use toefl_sim_providers::config::load_config_from;
use toefl_sim_providers::create_client;

use super::{clock_line, prompt_line};

const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

pub async fn execute(types: Option<String>, count: usize, config_path: Option<PathBuf>) -> Result<()> {
    let options = reading_options(types.as_deref(), count)?;
    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(?config, "loaded config");
    let trainer = Trainer::new(create_client(&config)?, config.trainer_config());

    let mut state = SessionState::new();
    let mut rng = StdRng::from_entropy();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run(&trainer, &mut state, &options, &mut rng, &mut stdin.lock(), &mut stdout).await
}

/// Build options from `--types` and `--count`. No types means the default set.
fn reading_options(types: Option<&str>, count: usize) -> Result<ReadingOptions> {
    let question_types = match types {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<QuestionType>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?,
        None => QuestionType::DEFAULTS.to_vec(),
    };
    let options = ReadingOptions {
        question_types,
        question_count: count,
    };
    options.validate()?;
    Ok(options)
}

async fn run<G, R, W>(
    trainer: &Trainer,
    state: &mut SessionState,
    options: &ReadingOptions,
    rng: &mut G,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    G: Rng + ?Sized,
    R: BufRead,
    W: Write,
{
    trainer.open_reading_setup(state);
    eprintln!("Generating reading passage...");
    let start = trainer
        .start_reading(state, options, rng, Utc::now())
        .await
        .context("could not start the reading section")?;

    writeln!(out, "Topic: {}", start.topic)?;
    writeln!(
        out,
        "You have {} for {} questions.\n",
        format_clock(trainer.config().reading_secs),
        start.question_count
    )?;
    writeln!(out, "{}\n", state.passage)?;

    let questions: Vec<_> = state
        .questions
        .iter()
        .map(|aq| aq.question.clone())
        .collect();

    'questions: for (index, question) in questions.iter().enumerate() {
        writeln!(out, "{}", clock_line(state))?;
        writeln!(
            out,
            "Question {}/{} [{}]",
            index + 1,
            questions.len(),
            question.kind
        )?;
        writeln!(out, "{}", question.question)?;
        for (letter, option) in LETTERS.iter().zip(&question.options) {
            writeln!(out, "  {letter}) {option}")?;
        }

        loop {
            let Some(line) = prompt_line(input, out, "Your answer (A-D, Enter to skip): ")? else {
                writeln!(out)?;
                break 'questions;
            };
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            match parse_choice(line) {
                Some(choice) => {
                    trainer.answer(state, index, choice)?;
                    break;
                }
                None => writeln!(out, "Please answer with a letter from A to D.")?,
            }
        }
        writeln!(out)?;
    }

    let report = trainer.submit_reading(state, Utc::now())?;
    print_report(out, &report)?;
    trainer.return_home(state);
    Ok(())
}

/// `A`-`D` (either case) or `1`-`4`.
fn parse_choice(input: &str) -> Option<usize> {
    let mut chars = input.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c.to_ascii_uppercase() {
        'A'..='D' => Some(c.to_ascii_uppercase() as usize - 'A' as usize),
        '1'..='4' => Some(c as usize - '1' as usize),
        _ => None,
    }
}

fn print_report<W: Write>(out: &mut W, report: &ReadingReport) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Your answer", "Correct answer", "Result"]);

    for result in &report.results {
        table.add_row(vec![
            Cell::new(result.number),
            Cell::new(&result.kind),
            Cell::new(result.selected.as_deref().unwrap_or("(skipped)")),
            Cell::new(&result.correct_answer),
            Cell::new(if result.is_correct { "correct" } else { "wrong" }),
        ]);
    }

    writeln!(out, "{table}")?;
    writeln!(
        out,
        "Score: {}/{} ({:.1}%)",
        report.score,
        report.total,
        report.percentage()
    )?;
    if report.overtime {
        writeln!(out, "Submitted after the time limit.")?;
    }
    Ok(())
}
