//! The interview control loop.
//!
//! ```text
//!            ┌───────────── last turn is the candidate's ─────────────┐
//!  entry ────┤                                                         ▼
//!            └──► GenerateQuestion ──► end        EvaluateAnswer ──► question_count < max ?
//!                        ▲                                              │ yes        │ no
//!                        └──────────────────────────────────────────────┘            ▼
//!                                                                                    end
//! ```
//!
//! One `invoke` is one run: at most an evaluation followed by a question.
//! The run ends after a question so the caller can wait for the reply.

use tracing::{debug, info};

use crate::config::{InterviewSettings, LlmSettings};
use crate::errors::AppError;
use crate::interview::nodes::{evaluate_answer, generate_question};
use crate::interview::state::InterviewState;
use crate::llm_client::LanguageModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    GenerateQuestion,
    EvaluateAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Next(Node),
    End,
}

/// Everything the loop needs from configuration.
#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub max_questions: u32,
    pub bank_ask_every: u32,
    pub temperature_ask: f32,
    pub temperature_eval: f32,
    pub max_tokens_question: u32,
    pub max_tokens_eval: u32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self::new(&InterviewSettings::default(), &LlmSettings::default())
    }
}

impl GraphSettings {
    pub fn new(interview: &InterviewSettings, llm: &LlmSettings) -> Self {
        Self {
            max_questions: interview.max_questions,
            bank_ask_every: interview.bank_ask_every,
            temperature_ask: llm.temperature_ask,
            temperature_eval: llm.temperature_eval,
            max_tokens_question: llm.max_tokens_question,
            max_tokens_eval: llm.max_tokens_eval,
        }
    }
}

/// Entry router: grade a pending answer, otherwise ask.
pub fn route_start(state: &InterviewState) -> Node {
    if state.awaiting_evaluation() {
        debug!("Routing to evaluate_answer");
        Node::EvaluateAnswer
    } else {
        debug!("Routing to generate_question");
        Node::GenerateQuestion
    }
}

/// After grading: keep asking until `max_questions` have been evaluated.
pub fn route_after_evaluation(state: &InterviewState, max_questions: u32) -> Route {
    if state.question_count >= max_questions {
        info!("Max questions reached. Ending interview.");
        Route::End
    } else {
        debug!("Continuing interview. Generating next question.");
        Route::Next(Node::GenerateQuestion)
    }
}

pub struct InterviewGraph {
    settings: GraphSettings,
}

impl InterviewGraph {
    pub fn new(settings: GraphSettings) -> Self {
        Self { settings }
    }

    /// Executes one run and returns the updated state.
    ///
    /// On return, `current_question` is `Some` when the candidate must answer
    /// and `None` when the interview is over. A failed LLM call aborts the run;
    /// the caller still owns its previous state.
    pub async fn invoke(
        &self,
        mut state: InterviewState,
        llm: &dyn LanguageModel,
    ) -> Result<InterviewState, AppError> {
        let mut node = route_start(&state);
        loop {
            match node {
                Node::GenerateQuestion => {
                    generate_question(&mut state, llm, &self.settings)
                        .await
                        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;
                    return Ok(state);
                }
                Node::EvaluateAnswer => {
                    evaluate_answer(&mut state, llm, &self.settings)
                        .await
                        .map_err(|e| AppError::Llm(format!("Answer evaluation failed: {e}")))?;
                    match route_after_evaluation(&state, self.settings.max_questions) {
                        Route::Next(next) => node = next,
                        Route::End => return Ok(state),
                    }
                }
            }
        }
    }
}
