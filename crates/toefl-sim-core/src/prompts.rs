//! Prompt templates sent to the language model.
//!
//! Each builder interpolates its inputs into a fixed instruction. The feedback
//! template pins down a line-oriented answer format that
//! [`crate::parser::parse_feedback`] reads back.

use crate::model::{QuestionType, WritingTaskKind};

/// Reading passage on `topic`.
pub fn passage_prompt(topic: &str) -> String {
    format!(
        "Generate a reading passage for TOEFL practice that:
1. Is about 400-600 words long (longer passages allow for more questions)
2. Contains academic vocabulary appropriate for TOEFL
3. Discusses the topic: {topic}
4. Has clear paragraph structure with 4-6 paragraphs
5. Includes relevant examples, evidence, and supporting details
6. Has a clear main idea and supporting points
7. Uses an academic tone suitable for university-level readers
8. Contains information that could be tested in different question types

Format the response as plain text only with a title."
    )
}

/// `count` multiple-choice questions about `passage`, restricted to `types`.
pub fn questions_prompt(passage: &str, count: usize, types: &[QuestionType]) -> String {
    let selected = types
        .iter()
        .map(QuestionType::label)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Generate {count} TOEFL-style questions for this passage:
{passage}

Create questions ONLY for the following selected question types: {selected}
Distribute the questions evenly among these types.

For each question:
1. Include the question type (must be one from: {selected})
2. Provide 4 multiple choice options that are plausible but with only one correct answer
3. Specify the correct answer index (0-3)
4. Make sure questions test real comprehension, not just superficial details
5. Include vocabulary questions that test context-specific meanings
6. For inference questions, ensure they require understanding implied information

Format the response exactly as follows (valid JSON array):
[
    {{
        "type": "[question_type]",
        "question": "[question_text]",
        "options": ["[option1]", "[option2]", "[option3]", "[option4]"],
        "correct": [correct_index]
    }},
    ...
]"#
    )
}

/// Writing task of the given kind built around `theme`.
pub fn writing_prompt(kind: WritingTaskKind, theme: &str) -> String {
    match kind {
        WritingTaskKind::Integrated => format!(
            "Generate a TOEFL Integrated Writing task about: {theme}\n\
             Use exactly these three sections:\n\
             1. '# Reading Passage' (250-word excerpt)\n\
             2. '# Lecture Summary' (150-200 word summary that challenges the reading)\n\
             3. '# Writing Prompt'\n\
             Make sure to include all three section headings exactly as shown above."
        ),
        WritingTaskKind::Independent => format!(
            "Generate a TOEFL Independent Writing task: one essay prompt about: {theme}\n\
             Use the '# Independent Writing Prompt' heading."
        ),
    }
}

/// Rubric scoring of `essay` written in response to `task_prompt`.
pub fn feedback_prompt(task_prompt: &str, essay: &str) -> String {
    format!(
        "You are a TOEFL writing instructor. Provide detailed feedback on this essay.

PROMPT:
{task_prompt}

STUDENT'S ESSAY:
{essay}

Rate these areas on a scale of 0-5, then give an overall score (0-30) and
specific recommendations. Answer using exactly this format:

Development: <0-5>/5
Organization: <0-5>/5
Language Use: <0-5>/5
Relevance: <0-5>/5
Overall: <0-30>/30
Recommendations:
<your recommendations>"
    )
}
