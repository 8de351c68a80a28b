//! The `toefl-sim writing` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use toefl_sim_core::client::placeholder;
use toefl_sim_core::error::PracticeError;
use toefl_sim_core::model::{FeedbackResult, RubricScores, WritingTaskKind};
use toefl_sim_core::parser::FEEDBACK_FALLBACK;
use toefl_sim_core::practice::Trainer;
use toefl_sim_core::session::SessionState;
use toefl_sim_core::timer::format_clock;
use toefl_sim_providers::config::load_config_from;
use toefl_sim_providers::create_client;

use super::{clock_line, prompt_line};

/// A line containing only this ends the essay.
const END_MARKER: &str = ".end";

pub async fn execute(
    kind: WritingTaskKind,
    essay_file: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(?config, "loaded config");
    let trainer = Trainer::new(create_client(&config)?, config.trainer_config());

    let essay = match &essay_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read essay: {}", path.display()))?,
        ),
        None => None,
    };

    let mut state = SessionState::new();
    let mut rng = StdRng::from_entropy();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run(
        &trainer,
        &mut state,
        kind,
        essay,
        &mut rng,
        &mut stdin.lock(),
        &mut stdout,
    )
    .await
}

async fn run<G, R, W>(
    trainer: &Trainer,
    state: &mut SessionState,
    kind: WritingTaskKind,
    essay: Option<String>,
    rng: &mut G,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    G: Rng + ?Sized,
    R: BufRead,
    W: Write,
{
    trainer.open_writing_setup(state);
    eprintln!("Generating {kind} writing task...");
    let task = trainer
        .start_writing(state, kind, rng, Utc::now())
        .await
        .context("could not start the writing task")?;

    writeln!(out, "{}", task.title())?;
    writeln!(out, "Theme: {}", task.theme)?;
    writeln!(
        out,
        "You have {}.\n",
        format_clock(trainer.config().writing_secs(kind))
    )?;
    writeln!(out, "{}\n", task.prompt)?;

    let essay = match essay {
        Some(text) => text,
        None => read_essay(trainer, state, input, out)?,
    };
    writeln!(out, "{}", clock_line(state))?;

    trainer.submit_essay(state, &essay, Utc::now())?;
    writeln!(out, "Essay submitted ({} words).", essay.split_whitespace().count())?;

    eprintln!("Scoring essay...");
    match trainer.request_feedback(state).await {
        Ok(feedback) => print_feedback(out, feedback)?,
        // The essay is already in; show the failure where the feedback would go.
        Err(PracticeError::Generation { source, .. }) => writeln!(out, "{}", placeholder(&source))?,
        Err(e) => return Err(e.into()),
    }
    trainer.return_home(state);
    Ok(())
}

/// Read essay lines until `.end` or end of input, keeping the draft as it grows.
fn read_essay<R: BufRead, W: Write>(
    trainer: &Trainer,
    state: &mut SessionState,
    input: &mut R,
    out: &mut W,
) -> Result<String> {
    writeln!(
        out,
        "Type your essay. Finish with a line containing only {END_MARKER} (or end of input)."
    )?;
    let mut essay = String::new();
    while let Some(line) = prompt_line(input, out, "")? {
        if line.trim() == END_MARKER {
            break;
        }
        essay.push_str(&line);
        essay.push('\n');
        trainer.save_draft(state, &essay)?;
    }
    Ok(essay)
}

fn print_feedback<W: Write>(out: &mut W, feedback: &FeedbackResult) -> Result<()> {
    let Some(parsed) = &feedback.parsed else {
        writeln!(out, "{FEEDBACK_FALLBACK}\n")?;
        writeln!(out, "{}", feedback.raw)?;
        return Ok(());
    };

    let mut table = Table::new();
    table.set_header(vec!["Area", "Score"]);
    let scores = &parsed.scores;
    for (area, score) in [
        ("Development", scores.development),
        ("Organization", scores.organization),
        ("Language Use", scores.language_use),
        ("Relevance", scores.relevance),
    ] {
        table.add_row(vec![
            Cell::new(area),
            Cell::new(format!("{score}/{}", RubricScores::MAX)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(format!("{}/{}", scores.total(), RubricScores::MAX * 4)),
    ]);

    writeln!(out, "{table}")?;
    if let Some(overall) = parsed.overall {
        writeln!(out, "Overall: {overall}/30")?;
    }
    writeln!(out, "\nRecommendations:\n{}", parsed.recommendations)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;
    use toefl_sim_core::client::ModelClient;
    use toefl_sim_core::model::EssayFeedback;
    use toefl_sim_core::practice::TrainerConfig;
    use toefl_sim_core::session::View;
    use toefl_sim_providers::MockProvider;

    fn mock_trainer() -> Trainer {
        let client = ModelClient::new(Arc::new(MockProvider::practice_material()), "mock-model");
        Trainer::new(client, TrainerConfig::default())
    }

    #[tokio::test]
    async fn essay_is_read_until_end_marker() {
        let trainer = mock_trainer();
        let mut state = SessionState::new();
        let mut rng = StdRng::seed_from_u64(7);
        trainer
            .start_writing(&mut state, WritingTaskKind::Independent, &mut rng, Utc::now())
            .await
            .unwrap();

        let mut input = Cursor::new("First line.\nSecond line.\n.end\nignored\n");
        let mut out = Vec::new();
        let essay = read_essay(&trainer, &mut state, &mut input, &mut out).unwrap();

        assert_eq!(essay, "First line.\nSecond line.\n");
        assert_eq!(state.essay_draft, essay);
        assert_eq!(state.view, View::Writing);
    }

    #[tokio::test]
    async fn full_flow_against_mock() {
        let trainer = mock_trainer();
        let mut state = SessionState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut input = Cursor::new("Small teams let people learn every part of a business.\n");
        let mut out = Vec::new();

        run(
            &trainer,
            &mut state,
            WritingTaskKind::Independent,
            None,
            &mut rng,
            &mut input,
            &mut out,
        )
        .await
        .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("# Independent Writing Prompt"));
        assert!(printed.contains("Essay submitted (10 words)."));
        assert!(printed.contains("Overall: 22/30"));
        assert!(printed.contains("16/20"));
        assert_eq!(state.view, View::Home);
        assert_eq!(state.used_writing_themes[&WritingTaskKind::Independent].len(), 1);
    }

    #[tokio::test]
    async fn failed_task_stays_on_setup_screen() {
        let client = ModelClient::new(Arc::new(MockProvider::with_fixed_response("")), "mock-model");
        let trainer = Trainer::new(client, TrainerConfig::default());
        let mut state = SessionState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut out = Vec::new();

        let err = run(
            &trainer,
            &mut state,
            WritingTaskKind::Integrated,
            Some("Essay".into()),
            &mut rng,
            &mut Cursor::new(""),
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("could not start the writing task"));
        assert_eq!(state.view, View::WritingSetup);
        assert!(state.writing_task.is_none());
        assert!(out.is_empty());
    }

    #[test]
    fn unparsed_feedback_shows_raw_text() {
        let feedback = FeedbackResult {
            raw: "Nice essay overall.".into(),
            parsed: None,
        };
        let mut out = Vec::new();
        print_feedback(&mut out, &feedback).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with(FEEDBACK_FALLBACK));
        assert!(printed.contains("Nice essay overall."));
    }

    #[test]
    fn parsed_feedback_without_overall() {
        let feedback = FeedbackResult {
            raw: String::new(),
            parsed: Some(EssayFeedback {
                scores: RubricScores {
                    development: 3,
                    organization: 2,
                    language_use: 4,
                    relevance: 5,
                },
                overall: None,
                recommendations: "Use more transitions.".into(),
            }),
        };
        let mut out = Vec::new();
        print_feedback(&mut out, &feedback).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("14/20"));
        assert!(!printed.contains("Overall:"));
        assert!(printed.contains("Use more transitions."));
    }
}
