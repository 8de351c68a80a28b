//! Offline provider with canned practice material.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use toefl_sim_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

const PASSAGE: &str = "The Formation of Coral Reefs

Coral reefs are built over thousands of years by colonies of tiny animals called polyps. \
Each polyp secretes a skeleton of calcium carbonate, and as generations of polyps live and \
die, their skeletons accumulate into massive limestone structures. Reef-building corals \
depend on a partnership with microscopic algae that live inside their tissues. The algae \
supply the coral with sugars produced by photosynthesis, while the coral offers shelter \
and nutrients in return.

Because the algae need sunlight, most reefs grow in clear, shallow water. When ocean \
temperatures rise, corals expel their algae and turn white, a process known as bleaching. \
A bleached reef is not yet dead, but without its partners it can starve within weeks.";

const QUESTIONS: &str = r#"[
    {"type": "Factual Information", "question": "What are coral skeletons made of?", "options": ["Silica", "Calcium carbonate", "Iron oxide", "Volcanic glass"], "correct": 1},
    {"type": "Vocabulary", "question": "The word \"secretes\" in the passage is closest in meaning to", "options": ["hides", "produces", "absorbs", "breaks"], "correct": 1},
    {"type": "Inference", "question": "What can be inferred about reefs in murky water?", "options": ["They grow faster", "They are more colorful", "They grow less readily", "They never bleach"], "correct": 2},
    {"type": "Reference", "question": "The word \"their\" in the last sentence of paragraph 1 refers to", "options": ["algae", "polyps", "skeletons", "corals"], "correct": 3}
]"#;

const INTEGRATED_TASK: &str = "# Reading Passage
Many cities have introduced congestion charges, arguing that a daily fee for driving \
into the center reduces traffic, cuts pollution, and raises money for public transport.

# Lecture Summary
The professor argues that the charges mostly shift traffic to surrounding roads, that \
pollution gains are small, and that low-income commuters bear most of the cost.

# Writing Prompt
Summarize the points made in the lecture, explaining how they challenge the specific \
points made in the reading passage.";

const INDEPENDENT_TASK: &str = "# Independent Writing Prompt
Do you agree or disagree with the following statement? It is better to work for a large \
company than for a small one. Use specific reasons and examples to support your answer.";

const FEEDBACK: &str = "Development: 4/5
Organization: 4/5
Language Use: 3/5
Relevance: 5/5
Overall: 22/30
Recommendations:
Vary your sentence structure and support the second body paragraph with a concrete example.";

/// A provider that never leaves the machine.
///
/// Replies are chosen by matching a marker phrase in the prompt; the first
/// matching rule wins, so more specific markers come first.
pub struct MockProvider {
    rules: Vec<(String, String)>,
    default_response: String,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    pub fn new(rules: Vec<(String, String)>) -> Self {
        Self {
            rules,
            default_response: "OK".to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.default_response = response.to_string();
        provider
    }

    /// Canned reading passage, questions, writing tasks and feedback.
    pub fn practice_material() -> Self {
        let rules = [
            ("TOEFL writing instructor", FEEDBACK),
            ("TOEFL-style questions", QUESTIONS),
            ("Integrated Writing task", INTEGRATED_TASK),
            ("Independent Writing task", INDEPENDENT_TASK),
            ("reading passage for TOEFL", PASSAGE),
        ];
        Self::new(
            rules
                .iter()
                .map(|(marker, reply)| (marker.to_string(), reply.to_string()))
                .collect(),
        )
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let content = self
            .rules
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Rough estimate, four characters per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toefl_sim_core::model::WritingTaskKind;
    use toefl_sim_core::parser::{parse_feedback, parse_questions};
    use toefl_sim_core::prompts;

    fn request(prompt: String) -> GenerateRequest {
        GenerateRequest {
            model: "mock-model".into(),
            prompt,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("hello");
        let response = provider.generate(&request("anything".into())).await.unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn canned_material_matches_each_prompt() {
        let provider = MockProvider::practice_material();

        let passage = provider
            .generate(&request(prompts::passage_prompt("Biology: Coral")))
            .await
            .unwrap();
        assert!(passage.content.starts_with("The Formation of Coral Reefs"));

        let questions = provider
            .generate(&request(prompts::questions_prompt(
                &passage.content,
                4,
                &toefl_sim_core::model::QuestionType::DEFAULTS,
            )))
            .await
            .unwrap();
        let parsed = parse_questions(&questions.content, 4, "Factual Information").unwrap();
        assert_eq!(parsed.questions.len(), 4);
        assert!(parsed.warnings.is_empty());

        let integrated = provider
            .generate(&request(prompts::writing_prompt(
                WritingTaskKind::Integrated,
                "Integrated: Urban: Traffic",
            )))
            .await
            .unwrap();
        assert!(integrated.content.contains("# Lecture Summary"));

        let independent = provider
            .generate(&request(prompts::writing_prompt(
                WritingTaskKind::Independent,
                "Independent: Work: Company size",
            )))
            .await
            .unwrap();
        assert!(independent.content.starts_with("# Independent Writing Prompt"));

        // The task text embedded in the feedback prompt must not shadow the feedback rule.
        let feedback = provider
            .generate(&request(prompts::feedback_prompt(
                &independent.content,
                "I would rather work for a small company.",
            )))
            .await
            .unwrap();
        let parsed = parse_feedback(&feedback.content).unwrap();
        assert_eq!(parsed.scores.total(), 16);
        assert_eq!(parsed.overall, Some(22));
        assert_eq!(provider.call_count(), 5);
    }
}
