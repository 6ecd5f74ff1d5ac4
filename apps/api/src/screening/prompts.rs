// Prompts for resume screening.

/// Slots: `{jd_text}`, `{resume_text}`, `{current_date}`.
pub const RESUME_SCREENING: &str = r#"You are an expert HR Recruiter and Technical Hiring Manager.
Screen the candidate's resume against the Job Description (JD).

Job Description:
{jd_text}

Resume content:
{resume_text}

Task:
1. Extract the candidate's full name from the resume. If not found, use "Unknown Candidate".
2. Extract the candidate's email address if one is present.
3. Analyze the resume against the JD keywords and requirements.
4. Identify the top 3-5 technical topics or skills that overlap between the JD and the resume.
5. Extract experience:
   - List every work period found (e.g. "Jan 2020 - Present", "2018 - 2020").
   - Read "Present", "Current" or "Now" (any case) as today's date: {current_date}.
   - Ignore any text after the date (in "2022 - current Austin, TX" read "2022 - current").
   - Compute the duration of each non-overlapping period and sum them.
   - Round the total to the nearest 0.5 years.
6. Assign a match score from 0 to 100.
7. Give a brief reasoning for the score.

Return a JSON object only:
{
    "name": "<Candidate Name>",
    "email": "<email or null>",
    "score": <int 0-100>,
    "years_of_experience": <number>,
    "reasoning": "<string>",
    "extracted_topics": ["<Topic1>", "<Topic2>", "<Topic3>"]
}"#;
