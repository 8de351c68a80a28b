//! Practice workflow.
//!
//! `Trainer` implements the handlers a front end calls in response to user
//! actions. Each handler takes the session explicitly, builds a prompt, calls
//! the model, and records the result. Handlers that fail leave the session as
//! it was.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::client::{GenerationParams, ModelClient, DEFAULT_MAX_TOKENS};
use crate::error::PracticeError;
use crate::model::{FeedbackResult, ReadingOptions, WritingTask, WritingTaskKind, CHOICES_PER_QUESTION};
use crate::parser::{parse_feedback, parse_questions};
use crate::prompts;
use crate::session::{AnsweredQuestion, SessionState, View};
use crate::timer::{
    ActivityTimer, INDEPENDENT_DURATION_SECS, INTEGRATED_DURATION_SECS, READING_DURATION_SECS,
};
use crate::topics::TopicSelector;

/// Sampling settings and time budgets for each practice step.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Passages get a little extra variety.
    pub passage_temperature: f64,
    /// Questions need to be accurate.
    pub questions_temperature: f64,
    pub writing_temperature: f64,
    pub feedback_temperature: f64,
    pub max_tokens: u32,
    pub reading_secs: i64,
    pub integrated_secs: i64,
    pub independent_secs: i64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            passage_temperature: 0.8,
            questions_temperature: 0.3,
            writing_temperature: 0.7,
            feedback_temperature: 0.2,
            max_tokens: DEFAULT_MAX_TOKENS,
            reading_secs: READING_DURATION_SECS,
            integrated_secs: INTEGRATED_DURATION_SECS,
            independent_secs: INDEPENDENT_DURATION_SECS,
        }
    }
}

impl TrainerConfig {
    fn params(&self, temperature: f64) -> GenerationParams {
        GenerationParams {
            temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn writing_secs(&self, kind: WritingTaskKind) -> i64 {
        match kind {
            WritingTaskKind::Integrated => self.integrated_secs,
            WritingTaskKind::Independent => self.independent_secs,
        }
    }
}

/// What `start_reading` produced, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingStart {
    pub topic: String,
    pub question_count: usize,
    /// Problems patched while reading the model's questions.
    pub warnings: Vec<String>,
}

/// Outcome for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub number: usize,
    pub kind: String,
    pub question: String,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Score sheet for a submitted reading section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingReport {
    pub results: Vec<QuestionResult>,
    pub score: usize,
    pub total: usize,
    /// Whether the answers came in after the time budget ran out.
    pub overtime: bool,
}

impl ReadingReport {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score as f64 / self.total as f64 * 100.0
    }
}

fn view_name(view: View) -> &'static str {
    match view {
        View::Home => "home",
        View::ReadingSetup => "reading setup",
        View::Reading => "reading",
        View::WritingSetup => "writing setup",
        View::Writing => "writing",
        View::Feedback => "feedback",
    }
}

fn require_view(state: &SessionState, expected: View, action: &'static str) -> Result<(), PracticeError> {
    if state.view != expected {
        return Err(PracticeError::WrongView {
            action,
            view: view_name(state.view),
        });
    }
    Ok(())
}

/// Handlers for reading and writing practice.
#[derive(Debug, Clone)]
pub struct Trainer {
    client: ModelClient,
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(client: ModelClient, config: TrainerConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &ModelClient {
        &self.client
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Leave any current activity and go to the reading options screen.
    pub fn open_reading_setup(&self, state: &mut SessionState) {
        state.reset_activity();
        state.view = View::ReadingSetup;
    }

    /// Leave any current activity and go to the writing task picker.
    pub fn open_writing_setup(&self, state: &mut SessionState) {
        state.reset_activity();
        state.view = View::WritingSetup;
    }

    /// Generate a passage and questions on a fresh topic and start the clock.
    ///
    /// On failure the state, including the current view, is left as it was.
    pub async fn start_reading<R: Rng + ?Sized>(
        &self,
        state: &mut SessionState,
        options: &ReadingOptions,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<ReadingStart, PracticeError> {
        options
            .validate()
            .map_err(|e| PracticeError::InvalidOptions(e.to_string()))?;

        // Work on a copy of the history so a failed attempt doesn't use up a topic.
        let mut history = state.used_topics.clone();
        let topic = TopicSelector::reading()
            .pick(&mut history, rng)
            .ok_or_else(|| PracticeError::InvalidOptions("no reading topics available".into()))?;
        tracing::info!(%topic, count = options.question_count, "generating reading section");

        let passage = self
            .client
            .complete(
                &prompts::passage_prompt(&topic),
                self.config.params(self.config.passage_temperature),
            )
            .await
            .map_err(|source| PracticeError::Generation {
                stage: "passage",
                source,
            })?;

        let raw_questions = self
            .client
            .complete(
                &prompts::questions_prompt(&passage, options.question_count, &options.question_types),
                self.config.params(self.config.questions_temperature),
            )
            .await
            .map_err(|source| PracticeError::Generation {
                stage: "questions",
                source,
            })?;
        tracing::debug!(raw = %raw_questions, "raw questions response");

        let fallback_type = options
            .question_types
            .first()
            .map(|t| t.label())
            .unwrap_or("General");
        let parsed = parse_questions(&raw_questions, options.question_count, fallback_type)?;
        for warning in &parsed.warnings {
            tracing::warn!("{warning}");
        }

        let mut timer = ActivityTimer::from_secs(self.config.reading_secs);
        timer.start(now);

        state.reset_activity();
        state.used_topics = history;
        state.topic = Some(topic.clone());
        state.passage = passage;
        state.questions = parsed
            .questions
            .into_iter()
            .map(|question| AnsweredQuestion {
                question,
                answer: None,
            })
            .collect();
        state.timer = Some(timer);
        state.view = View::Reading;

        Ok(ReadingStart {
            topic,
            question_count: state.questions.len(),
            warnings: parsed.warnings,
        })
    }

    /// Record an answer. Allowed after the timer runs out, not after submitting.
    pub fn answer(
        &self,
        state: &mut SessionState,
        index: usize,
        choice: usize,
    ) -> Result<(), PracticeError> {
        require_view(state, View::Reading, "answering")?;
        if state.timer.as_ref().is_some_and(ActivityTimer::is_submitted) {
            return Err(PracticeError::AlreadySubmitted);
        }
        if choice >= CHOICES_PER_QUESTION {
            return Err(PracticeError::NoSuchChoice(choice));
        }
        let slot = state
            .questions
            .get_mut(index)
            .ok_or(PracticeError::NoSuchQuestion(index))?;
        slot.answer = Some(choice);
        Ok(())
    }

    /// Score the reading section and stop the clock.
    pub fn submit_reading(
        &self,
        state: &mut SessionState,
        now: DateTime<Utc>,
    ) -> Result<ReadingReport, PracticeError> {
        require_view(state, View::Reading, "submitting answers")?;
        let timer = state
            .timer
            .as_mut()
            .ok_or(PracticeError::WrongView {
                action: "submitting answers",
                view: "reading",
            })?;
        if timer.is_submitted() {
            return Err(PracticeError::AlreadySubmitted);
        }
        let overtime = timer.is_expired(now);
        timer.submit();

        let results: Vec<QuestionResult> = state
            .questions
            .iter()
            .enumerate()
            .map(|(i, aq)| QuestionResult {
                number: i + 1,
                kind: aq.question.kind.clone(),
                question: aq.question.question.clone(),
                selected: aq
                    .answer
                    .and_then(|a| aq.question.options.get(a).cloned()),
                correct_answer: aq.question.correct_option().to_string(),
                is_correct: aq.is_correct(),
            })
            .collect();
        let score = results.iter().filter(|r| r.is_correct).count();
        let total = results.len();
        tracing::info!(score, total, overtime, "reading section submitted");

        Ok(ReadingReport {
            results,
            score,
            total,
            overtime,
        })
    }

    /// Generate a writing task of `kind` on a fresh theme and start the clock.
    pub async fn start_writing<'s, R: Rng + ?Sized>(
        &self,
        state: &'s mut SessionState,
        kind: WritingTaskKind,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<&'s WritingTask, PracticeError> {
        let mut history = state.writing_history(kind).clone();
        let theme = TopicSelector::writing(kind)
            .pick(&mut history, rng)
            .ok_or_else(|| PracticeError::InvalidOptions(format!("no {kind} themes available")))?;
        tracing::info!(%theme, %kind, "generating writing task");

        let prompt = self
            .client
            .complete(
                &prompts::writing_prompt(kind, &theme),
                self.config.params(self.config.writing_temperature),
            )
            .await
            .map_err(|source| PracticeError::Generation {
                stage: "writing task",
                source,
            })?;

        let mut timer = ActivityTimer::from_secs(self.config.writing_secs(kind));
        timer.start(now);

        state.reset_activity();
        *state.writing_history(kind) = history;
        state.timer = Some(timer);
        state.view = View::Writing;
        Ok(state.writing_task.insert(WritingTask {
            kind,
            theme,
            prompt,
        }))
    }

    /// Keep the in-progress essay text.
    pub fn save_draft(&self, state: &mut SessionState, text: &str) -> Result<(), PracticeError> {
        require_view(state, View::Writing, "editing the essay")?;
        state.essay_draft = text.to_string();
        Ok(())
    }

    /// Hand in the essay. Blank essays are rejected; a late essay is accepted.
    pub fn submit_essay(
        &self,
        state: &mut SessionState,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PracticeError> {
        require_view(state, View::Writing, "submitting an essay")?;
        if text.trim().is_empty() {
            return Err(PracticeError::EmptyEssay);
        }
        if let Some(timer) = state.timer.as_mut() {
            if timer.is_expired(now) {
                tracing::info!("essay submitted after time ran out");
            }
            timer.submit();
        }
        state.essay_draft = text.to_string();
        state.submitted_essay = Some(text.to_string());
        state.feedback = None;
        state.view = View::Feedback;
        Ok(())
    }

    /// Score the submitted essay. Generated once per essay and cached.
    pub async fn request_feedback<'s>(
        &self,
        state: &'s mut SessionState,
    ) -> Result<&'s FeedbackResult, PracticeError> {
        require_view(state, View::Feedback, "requesting feedback")?;

        let feedback = match state.feedback.take() {
            Some(existing) => existing,
            None => {
                let essay = state.submitted_essay.as_deref().unwrap_or_default();
                let task = state
                    .writing_task
                    .as_ref()
                    .map(|t| t.prompt.as_str())
                    .unwrap_or_default();
                let prompt = prompts::feedback_prompt(task, essay);

                let raw = self
                    .client
                    .complete(&prompt, self.config.params(self.config.feedback_temperature))
                    .await
                    .map_err(|source| PracticeError::Generation {
                        stage: "feedback",
                        source,
                    })?;

                let parsed = match parse_feedback(&raw) {
                    Ok(feedback) => Some(feedback),
                    Err(e) => {
                        tracing::warn!(error = %e, "could not parse essay feedback");
                        None
                    }
                };
                FeedbackResult { raw, parsed }
            }
        };

        Ok(state.feedback.insert(feedback))
    }

    /// Leave the current activity.
    pub fn return_home(&self, state: &mut SessionState) {
        state.reset_activity();
    }
}
