/// Resume field extraction prompt. Replace `{resume_text}` before sending.
pub const RESUME_EXTRACTION_PROMPT: &str = r#"Extract the candidate's details from the resume below.

Return a single JSON object with exactly these keys:
{
  "full_name": string,
  "emails": [string],
  "phones": [string],
  "location": string | null,
  "linkedin_url": string | null,
  "current_role": string | null,
  "current_employer": string | null,
  "total_experience_years": number | null,
  "current_salary": string | null,
  "expected_salary": string | null,
  "notice_period": string | null,
  "education": [
    {"degree": string, "institution": string, "major": string | null, "graduation_year": number | null}
  ],
  "experience": [
    {
      "job_title": string,
      "organization": string,
      "location": string | null,
      "reporting_to": string | null,
      "start_date": string | null,
      "end_date": string | null,
      "roles_responsibilities": string | null,
      "achievements": string | null
    }
  ],
  "skills": [string],
  "languages": [string],
  "confidence": number
}

Rules:
- Use null (or an empty list) for anything the resume does not state. Never invent values.
- total_experience_years is the sum of professional experience in years, as a number.
- Most recent experience first.
- confidence is your 0-100 estimate of how accurately the fields were extracted.

RESUME:
{resume_text}
"#;

pub fn build_resume_prompt(resume_text: &str) -> String {
    RESUME_EXTRACTION_PROMPT.replace("{resume_text}", resume_text)
}
