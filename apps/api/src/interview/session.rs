//! Interview sessions: one graph run per HTTP request, state persisted between.
//!
//! A session holds the interview state plus when the current question was
//! shown. Asked questions are appended to history here, never by the graph.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::candidates::store::{get_candidate, normalize_name, update_interview_result};
use crate::errors::AppError;
use crate::interview::state::{CandidateReply, ChatTurn, InterviewState};
use crate::interview::store::{find_active_session, get_session, insert_session, save_session};
use crate::models::candidate::CandidateRow;
use crate::models::session::{SessionRow, SESSION_COMPLETED};
use crate::report::recommendation::{generate_recommendation, RecommendationSettings};
use crate::report::summary::{count_answers, fair_average};
use crate::state::AppState;

pub const ALREADY_COMPLETED: &str = "Interview already completed (single attempt only).";
pub const NOT_ELIGIBLE: &str = "Name not found or resume score too low.";
const SESSION_RACED: &str = "Interview session was updated by another request";

/// What the candidate's screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub candidate_name: String,
    pub status: String,
    pub completed: bool,
    /// `None` once the interview is over.
    pub question: Option<String>,
    /// 1-based number of the current question.
    pub question_number: u32,
    pub max_questions: u32,
    pub complexity_level: u8,
    pub answered: usize,
    pub skipped: usize,
}

impl SessionView {
    fn new(session: &SessionRow, max_questions: u32) -> Self {
        let state = &session.state.0;
        let counts = count_answers(&state.evaluations);
        let completed = !session.is_active();
        Self {
            session_id: session.id,
            candidate_name: session.candidate_name.clone(),
            status: session.status.clone(),
            completed,
            question: if completed { None } else { state.current_question.clone() },
            question_number: if completed {
                state.question_count
            } else {
                state.question_count + 1
            },
            max_questions,
            complexity_level: state.complexity_level,
            answered: counts.answered,
            skipped: counts.skipped,
        }
    }
}

/// Why an interview stopped before the graph ran out of questions.
#[derive(Debug, Clone, Default)]
pub struct EarlyEnd {
    pub auto_ended: bool,
    pub reason: Option<String>,
}

/// Login. Resumes the candidate's unfinished session if there is one.
pub async fn start(app: &AppState, name: &str) -> Result<SessionView, AppError> {
    let name = normalize_name(name);
    let candidate = get_candidate(&app.db, &name)
        .await?
        .ok_or_else(|| AppError::Forbidden(NOT_ELIGIBLE.to_string()))?;

    if candidate.is_completed() {
        info!("Login refused for '{name}': interview already completed");
        return Err(AppError::Forbidden(ALREADY_COMPLETED.to_string()));
    }
    if !candidate.is_screened()
        || candidate.resume_score() < app.config.interview.min_eligible_resume_score
    {
        info!("Login refused for '{name}': not eligible");
        return Err(AppError::Forbidden(NOT_ELIGIBLE.to_string()));
    }

    let session = match find_active_session(&app.db, &name).await? {
        Some(session) => session,
        None => claim_session(app, &name, &candidate).await?,
    };
    if session.state.0.current_question.is_some() {
        info!("Resuming interview session {} for '{name}'", session.id);
        return Ok(view(app, &session));
    }
    open_session(app, session).await
}

/// Inserts the candidate's session before any question exists, so two logins
/// at once end up sharing one row.
async fn claim_session(
    app: &AppState,
    name: &str,
    candidate: &CandidateRow,
) -> Result<SessionRow, AppError> {
    let initial = InterviewState::new(
        candidate.topics(),
        candidate.question_bank(),
        candidate.years_of_experience(),
    );
    if let Some(session) = insert_session(&app.db, name, &initial, None).await? {
        info!(
            "Starting interview for '{name}': topics {:?}, {} bank questions",
            initial.topics,
            initial.question_bank.len()
        );
        return Ok(session);
    }

    info!("Concurrent login for '{name}', joining its session");
    find_active_session(&app.db, name)
        .await?
        .ok_or_else(|| AppError::Conflict(SESSION_RACED.to_string()))
}

/// Asks the first question of a claimed session. A failed LLM call leaves the
/// claim in place for the next login to retry.
async fn open_session(app: &AppState, mut session: SessionRow) -> Result<SessionView, AppError> {
    let mut state = app.graph.invoke(session.state.0.clone(), app.llm.as_ref()).await?;
    let started_at = ask_current_question(&mut state);
    session.state.0 = state;
    session.question_started_at = started_at;

    if started_at.is_none() {
        return finalize(app, session, None).await;
    }
    if save_session(&app.db, &mut session).await? {
        return Ok(view(app, &session));
    }

    // Another login asked first; show its question instead.
    let opened = load(app, session.id).await?;
    Ok(view(app, &opened))
}

pub async fn progress(app: &AppState, id: Uuid) -> Result<SessionView, AppError> {
    let session = load(app, id).await?;
    Ok(view(app, &session))
}

/// Records the candidate's reply, grades it and moves to the next question,
/// or finishes the interview after the last one.
pub async fn answer(app: &AppState, id: Uuid, reply: CandidateReply) -> Result<SessionView, AppError> {
    if let CandidateReply::Answer(text) = &reply {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Answer must not be empty".to_string()));
        }
    }

    let mut session = load_active(app, id).await?;
    let answered_at = Utc::now();
    let elapsed = session
        .question_started_at
        .map(|shown| seconds_between(shown, answered_at));

    let mut state = session.state.0.clone();
    let graded_before = state.evaluations.len();
    state.history.push(reply.into_turn());

    let mut state = app.graph.invoke(state, app.llm.as_ref()).await?;

    if state.evaluations.len() > graded_before {
        if let Some(latest) = state.evaluations.last_mut() {
            latest.duration_secs = elapsed;
        }
    }

    let started_at = ask_current_question(&mut state);
    session.state.0 = state;
    session.question_started_at = started_at;

    if started_at.is_none() {
        return finalize(app, session, None).await;
    }

    persist(app, &mut session).await?;
    Ok(view(app, &session))
}

/// Ends an interview early, e.g. after too many tab switches.
pub async fn end(app: &AppState, id: Uuid, early: EarlyEnd) -> Result<SessionView, AppError> {
    let session = load_active(app, id).await?;
    info!(
        "Interview {id} ended early (auto_ended={}, reason={:?})",
        early.auto_ended, early.reason
    );
    finalize(app, session, Some(early)).await
}

/// Scores the interview, writes the result onto the candidate and closes the session.
async fn finalize(
    app: &AppState,
    mut session: SessionRow,
    early: Option<EarlyEnd>,
) -> Result<SessionView, AppError> {
    let candidate = get_candidate(&app.db, &session.candidate_name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate '{}'", session.candidate_name)))?;

    let max_questions = app.config.interview.max_questions;
    let state = &mut session.state.0;
    state.current_question = None;
    let avg_score = fair_average(&state.evaluations, max_questions);

    let settings = RecommendationSettings::new(&app.config.interview, &app.config.llm);
    let mut recommendation = generate_recommendation(
        app.llm.as_ref(),
        &state.evaluations,
        avg_score,
        candidate.resume_score(),
        &settings,
    )
    .await;
    if let Some(early) = early.filter(|e| e.auto_ended) {
        recommendation.mark_auto_ended(early.reason);
    }

    session.status = SESSION_COMPLETED.to_string();
    session.question_started_at = None;

    let mut tx = app.db.begin().await?;
    if !save_session(&mut *tx, &mut session).await? {
        warn!("Interview session {} changed underneath this request", session.id);
        return Err(AppError::Conflict(SESSION_RACED.to_string()));
    }
    let stored = update_interview_result(
        &mut *tx,
        &session.candidate_name,
        &session.state.0.evaluations,
        avg_score,
        &recommendation,
    )
    .await?;
    if !stored {
        warn!(
            "Candidate '{}' is no longer awaiting an interview, session {} left open",
            session.candidate_name, session.id
        );
        return Err(AppError::Conflict(format!(
            "Candidate '{}' is no longer awaiting an interview",
            session.candidate_name
        )));
    }
    tx.commit().await?;

    info!(
        "Interview for '{}' completed: {} questions, fair score {avg_score:.2}, decision {}",
        session.candidate_name,
        session.state.0.evaluations.len(),
        recommendation.decision.as_str()
    );
    Ok(view(app, &session))
}

/// Puts the freshly generated question into history and returns when it was shown.
fn ask_current_question(state: &mut InterviewState) -> Option<DateTime<Utc>> {
    let question = state.current_question.clone()?;
    state.history.push(ChatTurn::assistant(question));
    Some(Utc::now())
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds().max(0) as f64) / 1000.0
}

fn view(app: &AppState, session: &SessionRow) -> SessionView {
    SessionView::new(session, app.config.interview.max_questions)
}

async fn load(app: &AppState, id: Uuid) -> Result<SessionRow, AppError> {
    get_session(&app.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview session {id}")))
}

async fn load_active(app: &AppState, id: Uuid) -> Result<SessionRow, AppError> {
    let session = load(app, id).await?;
    if !session.is_active() {
        return Err(AppError::Conflict("Interview already completed".to_string()));
    }
    Ok(session)
}

async fn persist(app: &AppState, session: &mut SessionRow) -> Result<(), AppError> {
    if save_session(&app.db, session).await? {
        Ok(())
    } else {
        warn!("Interview session {} changed underneath this request", session.id);
        Err(AppError::Conflict(SESSION_RACED.to_string()))
    }
}
