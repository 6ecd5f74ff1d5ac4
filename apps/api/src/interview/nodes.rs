//! The two graph nodes: ask a question, grade the answer.
//!
//! Nodes mutate the state in place and never touch history; appending the
//! asked question and the candidate's reply is the session's job.

use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::interview::graph::GraphSettings;
use crate::interview::prompts::{
    EVALUATION, NOTHING_TO_AVOID, QUESTION_GENERATION, QUESTION_STYLES, QUESTION_TYPE,
};
use crate::interview::state::{
    score_from_value, Evaluation, InterviewState, Role, DEFAULT_TOPIC, MAX_COMPLEXITY,
};
use crate::llm_client::prompts::{fill, truncate_chars, JSON_ONLY_SYSTEM};
use crate::llm_client::{extract_json, CompletionRequest, LanguageModel, LlmError};

pub const NO_ANSWER: &str = "No answer provided.";
pub const SKIPPED_ANSWER: &str = "Allowed to Skip.";
pub const SKIPPED_FEEDBACK: &str = "Question skipped by candidate.";
pub const PARSE_FAILURE_FEEDBACK: &str = "Failed to parse evaluation response.";
pub const MISSING_FEEDBACK: &str = "No feedback.";

/// Longest excerpt of a past question listed in the "avoid" section.
const AVOID_EXCERPT_CHARS: usize = 200;

/// Sets `current_question`, either drawn from the HR question bank or generated.
pub async fn generate_question(
    state: &mut InterviewState,
    llm: &dyn LanguageModel,
    settings: &GraphSettings,
) -> Result<(), LlmError> {
    info!("Generating question {}", state.question_count + 1);

    let drawn = if uses_bank(state, settings.bank_ask_every) {
        draw_from_bank(&mut state.question_bank)
    } else {
        None
    };

    let question = match drawn {
        Some(question) => {
            state.bank_index += 1;
            info!("Picked question from bank: {question}");
            question
        }
        None => {
            debug!("Generating question via LLM");
            let prompt = question_prompt(state);
            let request = CompletionRequest::new(
                &prompt,
                settings.temperature_ask,
                settings.max_tokens_question,
            );
            let question = llm.complete(request).await?.trim().to_string();
            info!("Generated question: {question}");
            question
        }
    };

    state.current_question = Some(question);
    Ok(())
}

/// Grades the candidate's latest reply, then advances complexity and the counter.
pub async fn evaluate_answer(
    state: &mut InterviewState,
    llm: &dyn LanguageModel,
    settings: &GraphSettings,
) -> Result<(), LlmError> {
    info!("Evaluating answer {}", state.question_count + 1);

    let question = state
        .current_question
        .clone()
        .or_else(|| state.asked_questions().last().map(str::to_string))
        .unwrap_or_default();
    let reply = state.last_turn().filter(|turn| turn.role == Role::User);

    let evaluation = match reply {
        Some(turn) if turn.is_skip() => {
            info!("Question skipped by candidate");
            Evaluation {
                question,
                user_answer: SKIPPED_ANSWER.to_string(),
                score: 0,
                feedback: SKIPPED_FEEDBACK.to_string(),
                topics: state.topics.clone(),
                complexity: state.complexity_level,
                skipped: true,
                duration_secs: None,
            }
        }
        other => {
            let user_answer = other
                .map(|turn| turn.content.clone())
                .unwrap_or_else(|| NO_ANSWER.to_string());
            let prompt = fill(
                EVALUATION,
                &[("question", &question), ("user_answer", &user_answer)],
            );
            let request =
                CompletionRequest::new(&prompt, settings.temperature_eval, settings.max_tokens_eval)
                    .with_system(JSON_ONLY_SYSTEM);
            let raw = llm.complete(request).await?;
            let (score, feedback) = parse_grade(&raw);
            info!("Answer evaluated. Score: {score}");
            Evaluation {
                question,
                user_answer,
                score,
                feedback,
                topics: state.topics.clone(),
                complexity: state.complexity_level,
                skipped: false,
                duration_secs: None,
            }
        }
    };

    state.evaluations.push(evaluation);
    state.complexity_level = (state.complexity_level + 1).min(MAX_COMPLEXITY);
    state.question_count += 1;
    state.current_question = None;
    Ok(())
}

/// Every `bank_ask_every`-th question (counting from the first) comes from the bank.
fn uses_bank(state: &InterviewState, bank_ask_every: u32) -> bool {
    !state.question_bank.is_empty()
        && bank_ask_every > 0
        && state.question_count % bank_ask_every == 0
}

/// Removes a uniformly random non-blank question from the bank.
fn draw_from_bank(bank: &mut Vec<String>) -> Option<String> {
    let mut rng = rand::thread_rng();
    while !bank.is_empty() {
        let pick = rng.gen_range(0..bank.len());
        let question = bank.remove(pick);
        let question = question.trim();
        if !question.is_empty() {
            return Some(question.to_string());
        }
    }
    None
}

fn question_prompt(state: &InterviewState) -> String {
    let index = state.question_count as usize;
    // Stored sessions may carry an empty topic list.
    let focus_topic = state
        .topics
        .get(index.checked_rem(state.topics.len()).unwrap_or(0))
        .map_or(DEFAULT_TOPIC, String::as_str);
    let topics = if state.topics.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        state.topics.join(", ")
    };
    let style = QUESTION_STYLES[index % QUESTION_STYLES.len()];

    let avoid: Vec<String> = state
        .asked_questions()
        .map(|q| format!("- {}", truncate_chars(q, AVOID_EXCERPT_CHARS)))
        .collect();
    let avoid_concepts = if avoid.is_empty() {
        NOTHING_TO_AVOID.to_string()
    } else {
        avoid.join("\n")
    };

    fill(
        QUESTION_GENERATION,
        &[
            ("topics", &topics),
            ("question_type", QUESTION_TYPE),
            ("years_of_experience", &state.years_of_experience.to_string()),
            ("complexity_level", &state.complexity_level.to_string()),
            ("history", &state.formatted_history()),
            ("focus_topic", focus_topic),
            ("style", style),
            ("avoid_concepts", &avoid_concepts),
        ],
    )
}

/// Reads `{score, feedback}` from the grader. Unparseable output scores 0.
fn parse_grade(raw: &str) -> (u8, String) {
    match extract_json::<Value>(raw) {
        Ok(value) => {
            let score = value.get("score").map(|s| score_from_value(s, 10)).unwrap_or(0);
            let feedback = value
                .get("feedback")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .unwrap_or(MISSING_FEEDBACK)
                .to_string();
            (score, feedback)
        }
        Err(e) => {
            warn!("Could not parse evaluation response: {e}");
            (0, PARSE_FAILURE_FEEDBACK.to_string())
        }
    }
}
