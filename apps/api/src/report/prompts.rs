// Prompt for the hiring-committee style recommendation.

/// Slots: `{avg_score}`, `{resume_score}`, `{interview_data}`.
pub const HR_RECOMMENDATION: &str = r#"You are an expert interviewer sitting on a hiring committee.
Review the candidate's interview performance and judge whether they should move forward.

Inputs:
- Interview average score (0-10): {avg_score}
- Resume match score (0-100): {resume_score}
- Interview Q&A evaluations: {interview_data}

Assess the quality of responses, knowledge level, role fit and overall readiness for the position.

Return a JSON object only:
{
  "decision": "<Move Forward | Hold | Reject>",
  "knowledge_level": "<Junior | Mid | Senior | Lead>",
  "role_fit": "<Low | Medium | High>",
  "readiness": "<Low | Medium | High>",
  "summary": "<2-4 sentence summary>",
  "concerns": ["<short concern 1>", "<short concern 2>"]
}"#;
