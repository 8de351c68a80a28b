//! In-memory session state.
//!
//! One `SessionState` per running program. Handlers in [`crate::practice`]
//! take it by `&mut`; nothing here is persisted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{FeedbackResult, Question, WritingTask, WritingTaskKind};
use crate::timer::{ActivityTimer, TimerStatus};
use crate::topics::TopicHistory;

/// Which screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    ReadingSetup,
    Reading,
    WritingSetup,
    Writing,
    Feedback,
}

/// A question together with the user's current answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion {
    pub question: Question,
    pub answer: Option<usize>,
}

impl AnsweredQuestion {
    pub fn is_correct(&self) -> bool {
        self.answer == Some(self.question.correct)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub view: View,
    pub timer: Option<ActivityTimer>,
    pub used_topics: TopicHistory,
    pub used_writing_themes: HashMap<WritingTaskKind, TopicHistory>,

    pub topic: Option<String>,
    pub passage: String,
    pub questions: Vec<AnsweredQuestion>,

    pub writing_task: Option<WritingTask>,
    pub essay_draft: String,
    pub submitted_essay: Option<String>,
    pub feedback: Option<FeedbackResult>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Theme history for one writing kind, created on first use.
    pub fn writing_history(&mut self, kind: WritingTaskKind) -> &mut TopicHistory {
        self.used_writing_themes.entry(kind).or_default()
    }

    pub fn timer_status(&self, now: DateTime<Utc>) -> TimerStatus {
        self.timer
            .as_ref()
            .map(|t| t.status(now))
            .unwrap_or(TimerStatus::NotStarted)
    }

    /// Seconds left on the active timer, if one is running.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.timer.as_ref().map(|t| t.remaining(now).num_seconds())
    }

    pub fn is_timer_expired(&self, now: DateTime<Utc>) -> bool {
        self.timer.as_ref().is_some_and(|t| t.is_expired(now))
    }

    /// Drop the current activity and go home. Topic and theme history survive.
    pub fn reset_activity(&mut self) {
        self.topic = None;
        self.passage.clear();
        self.questions.clear();
        self.writing_task = None;
        self.essay_draft.clear();
        self.submitted_essay = None;
        self.feedback = None;
        self.timer = None;
        self.view = View::Home;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn new_session_is_home_without_timer() {
        let state = SessionState::new();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(state.view, View::Home);
        assert_eq!(state.timer_status(now), TimerStatus::NotStarted);
        assert!(!state.is_timer_expired(now));
        assert!(state.remaining_secs(now).is_none());
    }

    #[test]
    fn reset_keeps_history() {
        let mut state = SessionState::new();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut timer = ActivityTimer::from_secs(60);
        timer.start(now);
        state.timer = Some(timer);
        state.passage = "text".into();
        state.view = View::Reading;
        state.writing_history(WritingTaskKind::Independent);

        assert_eq!(state.remaining_secs(now + Duration::seconds(20)), Some(40));

        state.reset_activity();
        assert_eq!(state.view, View::Home);
        assert!(state.timer.is_none());
        assert!(state.passage.is_empty());
        assert!(state
            .used_writing_themes
            .contains_key(&WritingTaskKind::Independent));
    }
}
