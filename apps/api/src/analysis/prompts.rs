// Resume analysis prompt templates.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub const ANALYSIS_SYSTEM_PREAMBLE: &str = "\
You are an expert resume reviewer and ATS (Applicant Tracking System) specialist. \
Score resumes honestly and consistently; do not inflate scores.";

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume for a {job_role} position.
Analysis type: {analysis_type}

RESUME:
{resume_text}

OUTPUT SCHEMA (return exactly this structure; all scores are integers 0-100):
{
  "atsScore": number,
  "overallScore": number,
  "strengths": ["string"],
  "weaknesses": ["string"],
  "recommendations": [
    {"category": "string", "priority": "high" | "medium" | "low", "description": "string", "impact": number}
  ],
  "skillsAnalysis": {
    "presentSkills": ["string"],
    "missingSkills": ["string"],
    "skillsMatch": number,
    "industryRelevance": number
  },
  "sectionAnalysis": {
    "contactInfo": {"score": number, "feedback": "string"},
    "summary": {"score": number, "feedback": "string"},
    "experience": {"score": number, "feedback": "string"},
    "education": {"score": number, "feedback": "string"},
    "skills": {"score": number, "feedback": "string"}
  },
  "keywordAnalysis": {
    "density": number,
    "relevantKeywords": ["string"],
    "missingKeywords": ["string"]
  },
  "formatting": {"score": number, "issues": ["string"], "suggestions": ["string"]},
  "industryBenchmark": {"industry": "string", "averageScore": number, "percentile": number},
  "estimatedReading": {"timeSeconds": number, "difficulty": "easy" | "medium" | "hard"}
}

RULES:
- presentSkills and missingSkills must not share any entry.
- missingSkills and missingKeywords should be specific to a {job_role} role.
- Give 3-6 strengths, 3-6 weaknesses and 3-8 recommendations."#;

pub fn analysis_system_prompt() -> String {
    format!("{ANALYSIS_SYSTEM_PREAMBLE} {JSON_ONLY_SYSTEM}")
}

pub fn build_analysis_prompt(resume_text: &str, job_role: &str, analysis_type: &str) -> String {
    // resume_text goes last so text inside the resume cannot inject placeholders
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{job_role}", job_role)
        .replace("{analysis_type}", analysis_type)
        .replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_all_inputs() {
        let prompt = build_analysis_prompt("Jane Doe, SQL", "data analyst", "ats");
        assert!(prompt.contains("for a data analyst position"));
        assert!(prompt.contains("Analysis type: ats"));
        assert!(prompt.contains("Jane Doe, SQL"));
        assert!(!prompt.contains("{job_role}"));
    }

    #[test]
    fn test_resume_text_placeholders_are_not_expanded() {
        let prompt = build_analysis_prompt("my role is {job_role}", "nurse", "comprehensive");
        assert!(prompt.contains("my role is {job_role}"));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        assert!(analysis_system_prompt().contains("valid JSON object"));
    }
}
