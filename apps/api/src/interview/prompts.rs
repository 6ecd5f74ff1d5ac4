// LLM prompt templates for the interview loop.
// Slots are filled with `llm_client::prompts::fill`.

/// Question styles cycled through so consecutive questions differ in shape.
pub const QUESTION_STYLES: [&str; 5] = [
    "Scenario/Problem Solving",
    "Conceptual/Deep Dive",
    "Debugging/Troubleshooting",
    "Comparative Analysis",
    "System Design/Architecture",
];

/// Every generated question is conceptual; coding exercises are out of scope.
pub const QUESTION_TYPE: &str = "conceptual/theoretical";

/// Question generation prompt. Slots: `{topics}`, `{question_type}`,
/// `{years_of_experience}`, `{complexity_level}`, `{history}`, `{focus_topic}`,
/// `{style}`, `{avoid_concepts}`.
pub const QUESTION_GENERATION: &str = r#"You are a technical interviewer for the following topics: {topics}.
Ask one {question_type} question that measures the candidate's knowledge.
Candidate profile: {years_of_experience} years of experience.
Current complexity level: {complexity_level} (scale 1-10, 1 is basic, 10 is expert).

Conversation so far:
{history}

Rules:
1. Stay strictly within the listed topics ({topics}).
2. This question MUST focus on: {focus_topic}. If the focus is generic, pick any fitting sub-topic.
3. Ask it in this style: {style}.
   - Scenario/Problem Solving: a realistic situation to resolve.
   - Conceptual/Deep Dive: how something works under the hood.
   - Debugging/Troubleshooting: a concrete bug or incident to diagnose.
   - Comparative Analysis: trade-offs between two approaches.
   - System Design/Architecture: designing a component for scale or reliability.
4. Do NOT repeat any of these already-covered questions, their problems or their scenarios:
{avoid_concepts}
5. Calibrate to seniority:
   - 0-2 years: fundamentals, definitions, basic usage.
   - 3-5 years: implementation details, patterns, common pitfalls.
   - 5+ years: production incidents, safe refactoring, opinionated trade-offs, internals.
6. Prefer a fresh sub-topic. Only follow up when the previous answer was vague or raised something worth probing.

Reply with the question text only, at most 15 lines."#;

/// Answer grading prompt. Slots: `{question}`, `{user_answer}`.
pub const EVALUATION: &str = r#"You are an expert grader evaluating a candidate's answer to a technical interview question.

Question: {question}
Candidate's Answer: {user_answer}

Grade on correctness, completeness and clarity with an integer score from 0 to 10.
Be balanced: a generally correct answer with minor gaps is typically 6-7.
Reserve 9-10 for excellent, complete answers and 0-3 for clearly wrong or empty ones.
Give brief feedback explaining the score.

Respond with JSON exactly in this shape:
{
    "score": <int>,
    "feedback": "<string>"
}"#;

/// Placeholder listed under "avoid" before any question has been asked.
pub const NOTHING_TO_AVOID: &str = "- (none yet)";
