use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::config::InterviewSettings;
use crate::interview::state::Evaluation;
use crate::models::candidate::CandidateRow;
use crate::report::recommendation::{Decision, Recommendation};

/// Sum of scores over the configured question count. Questions never asked
/// (interview ended early) count as zero.
pub fn fair_average(evaluations: &[Evaluation], max_questions: u32) -> f64 {
    if max_questions == 0 {
        return 0.0;
    }
    let total: u32 = evaluations.iter().map(|e| u32::from(e.score)).sum();
    f64::from(total) / f64::from(max_questions)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnswerCounts {
    pub answered: usize,
    pub skipped: usize,
}

pub fn count_answers(evaluations: &[Evaluation]) -> AnswerCounts {
    let skipped = evaluations.iter().filter(|e| e.was_skipped()).count();
    AnswerCounts {
        answered: evaluations.len() - skipped,
        skipped,
    }
}

/// Total answering time; `None` when no evaluation carries a duration.
pub fn total_duration_secs(evaluations: &[Evaluation]) -> Option<f64> {
    let durations: Vec<f64> = evaluations.iter().filter_map(|e| e.duration_secs).collect();
    if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum())
    }
}

pub fn format_duration(secs: f64) -> String {
    let secs = secs.max(0.0).round() as u64;
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Scoring knobs the reports need.
#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    pub max_questions: u32,
    pub min_eligible_resume_score: i64,
}

impl From<&InterviewSettings> for ReportSettings {
    fn from(settings: &InterviewSettings) -> Self {
        Self {
            max_questions: settings.max_questions,
            min_eligible_resume_score: settings.min_eligible_resume_score,
        }
    }
}

/// Interview score shown for a candidate: recomputed from the stored
/// evaluations once completed, the stored score when there are none.
fn interview_score(row: &CandidateRow, evaluations: &[Evaluation], max_questions: u32) -> Option<f64> {
    if !row.is_completed() {
        return None;
    }
    if evaluations.is_empty() {
        row.interview_score
    } else {
        Some(fair_average(evaluations, max_questions))
    }
}

/// One dashboard row.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub name: String,
    pub resume_score: i64,
    pub eligible: bool,
    pub interview_score: Option<f64>,
    pub questions_answered: usize,
    pub questions_skipped: usize,
    pub total_duration_secs: Option<f64>,
    pub status: String,
    pub decision: Option<Decision>,
    pub screened_at: Option<NaiveDateTime>,
}

pub fn summarize(row: &CandidateRow, settings: ReportSettings) -> CandidateSummary {
    let evaluations = row.evaluations();
    let counts = count_answers(&evaluations);
    CandidateSummary {
        name: row.name.clone(),
        resume_score: row.resume_score(),
        eligible: row.resume_score() >= settings.min_eligible_resume_score,
        interview_score: interview_score(row, &evaluations, settings.max_questions),
        questions_answered: counts.answered,
        questions_skipped: counts.skipped,
        total_duration_secs: total_duration_secs(&evaluations),
        status: row.status.clone().unwrap_or_default(),
        decision: row.recommendation().map(|r| r.decision),
        screened_at: row.timestamp,
    }
}

/// Full per-candidate report.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewReport {
    pub name: String,
    pub email: Option<String>,
    pub resume_score: i64,
    pub eligible: bool,
    pub resume_analysis: Value,
    pub topics: Vec<String>,
    pub status: String,
    pub interview_score: Option<f64>,
    pub max_questions: u32,
    pub answers: AnswerCounts,
    pub total_duration_secs: Option<f64>,
    pub evaluations: Vec<Evaluation>,
    pub recommendation: Option<Recommendation>,
    pub screened_at: Option<NaiveDateTime>,
}

pub fn build_report(row: &CandidateRow, settings: ReportSettings) -> InterviewReport {
    let evaluations = row.evaluations();
    InterviewReport {
        name: row.name.clone(),
        email: row.email.clone(),
        resume_score: row.resume_score(),
        eligible: row.resume_score() >= settings.min_eligible_resume_score,
        resume_analysis: row.analysis(),
        topics: row.topics(),
        status: row.status.clone().unwrap_or_default(),
        interview_score: interview_score(row, &evaluations, settings.max_questions),
        max_questions: settings.max_questions,
        answers: count_answers(&evaluations),
        total_duration_secs: total_duration_secs(&evaluations),
        recommendation: row.recommendation(),
        screened_at: row.timestamp,
        evaluations,
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders a report as a Markdown document for HR.
pub fn render_markdown(report: &InterviewReport) -> String {
    let mut md = format!("# Interview Report: {}\n\n", title_case(&report.name));

    md.push_str("## Overview\n\n");
    if let Some(email) = report.email.as_deref().filter(|e| !e.is_empty()) {
        md.push_str(&format!("- **Email:** {email}\n"));
    }
    md.push_str(&format!(
        "- **Resume Score:** {}/100 ({})\n",
        report.resume_score,
        if report.eligible { "eligible" } else { "not eligible" }
    ));
    match report.interview_score {
        Some(score) => md.push_str(&format!("- **Interview Score:** {score:.1}/10\n")),
        None => md.push_str("- **Interview Score:** N/A\n"),
    }
    md.push_str(&format!(
        "- **Questions:** {} answered, {} skipped (of {})\n",
        report.answers.answered, report.answers.skipped, report.max_questions
    ));
    if let Some(secs) = report.total_duration_secs {
        md.push_str(&format!("- **Total Time:** {}\n", format_duration(secs)));
    }
    md.push_str(&format!("- **Status:** {}\n", report.status));
    if !report.topics.is_empty() {
        md.push_str(&format!("- **Topics:** {}\n", report.topics.join(", ")));
    }
    md.push('\n');

    if let Some(rec) = &report.recommendation {
        md.push_str("## Recommendation\n\n");
        md.push_str(&format!("- **Decision:** {}\n", rec.decision.as_str()));
        if let Some(performance) = rec.performance {
            md.push_str(&format!("- **Performance:** {}\n", performance.as_str()));
        }
        md.push_str(&format!("- **Knowledge Level:** {}\n", rec.knowledge_level));
        md.push_str(&format!("- **Role Fit:** {}\n", rec.role_fit));
        md.push_str(&format!("- **Readiness:** {}\n", rec.readiness));
        if rec.auto_ended {
            md.push_str(&format!(
                "- **Auto-ended:** {}\n",
                rec.auto_end_reason.as_deref().unwrap_or("yes")
            ));
        }
        md.push('\n');
        if !rec.score_based_summary.is_empty() {
            md.push_str(&format!("{}\n\n", rec.score_based_summary));
        }
        md.push_str(&format!("{}\n\n", rec.summary));
        if !rec.concerns.is_empty() {
            md.push_str("### Concerns\n\n");
            for concern in &rec.concerns {
                md.push_str(&format!("- {concern}\n"));
            }
            md.push('\n');
        }
    }

    if !report.evaluations.is_empty() {
        md.push_str("## Questions\n\n");
        for (i, eval) in report.evaluations.iter().enumerate() {
            md.push_str(&format!("### Q{}: {}\n", i + 1, eval.question));
            if eval.was_skipped() {
                md.push_str("- **Answer:** _skipped_\n");
            } else {
                md.push_str(&format!("- **Answer:** {}\n", eval.user_answer));
            }
            md.push_str(&format!("- **Score:** {}/10\n", eval.score));
            md.push_str(&format!("- **Complexity:** {}\n", eval.complexity));
            if let Some(secs) = eval.duration_secs {
                md.push_str(&format!("- **Time:** {}\n", format_duration(secs)));
            }
            md.push_str(&format!("- **Feedback:** {}\n\n", eval.feedback));
        }
    }
    md
}
