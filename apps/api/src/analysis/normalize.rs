//! Turns a provider's raw reply into a complete `ResumeAnalysisResult`.
//!
//! Syntactically invalid JSON, JSON that is not an object, and objects with
//! none of the analysis fields are rejected as `MalformedOutput`. Anything
//! else is accepted field by field: numbers are rounded and clamped,
//! wrong-typed or missing fields take the value from `defaults` (the
//! heuristic result for the same resume), so a result is never partial.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::heuristic::without;
use crate::analysis::models::{
    clamp_score, EstimatedReading, Formatting, IndustryBenchmark, KeywordAnalysis, Priority,
    ReadingDifficulty, Recommendation, ResumeAnalysisResult, SectionAnalysis, SectionScore,
    SkillsAnalysis,
};
use crate::llm_client::strip_json_fences;

type Object = Map<String, Value>;

#[derive(Debug, Error)]
pub enum MalformedOutput {
    #[error("response is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("response is valid JSON but not an object")]
    NotAnObject,

    #[error("response object has none of the analysis fields")]
    MissingSchema,
}

/// Top-level fields of an analysis. A reply must carry at least one.
const RESULT_KEYS: [&str; 11] = [
    "atsScore",
    "overallScore",
    "strengths",
    "weaknesses",
    "recommendations",
    "skillsAnalysis",
    "sectionAnalysis",
    "keywordAnalysis",
    "formatting",
    "industryBenchmark",
    "estimatedReading",
];

/// Upper bound for a provider's reading-time estimate, in seconds.
const MAX_READING_SECONDS: f64 = 600.0;

pub fn normalize_provider_output(
    raw: &str,
    defaults: &ResumeAnalysisResult,
) -> Result<ResumeAnalysisResult, MalformedOutput> {
    let value: Value = serde_json::from_str(strip_json_fences(raw))?;
    let obj = value.as_object().ok_or(MalformedOutput::NotAnObject)?;
    if !RESULT_KEYS.iter().any(|key| obj.contains_key(*key)) {
        return Err(MalformedOutput::MissingSchema);
    }
    Ok(normalize_object(obj, defaults))
}

fn normalize_object(obj: &Object, d: &ResumeAnalysisResult) -> ResumeAnalysisResult {
    let empty = Object::new();

    let skills = object(obj, "skillsAnalysis").unwrap_or(&empty);
    let present_skills = strings(skills, "presentSkills", &d.skills_analysis.present_skills);
    let missing_skills = without(
        strings(skills, "missingSkills", &d.skills_analysis.missing_skills),
        &present_skills,
    );

    let sections = object(obj, "sectionAnalysis").unwrap_or(&empty);
    let keywords = object(obj, "keywordAnalysis").unwrap_or(&empty);
    let formatting = object(obj, "formatting").unwrap_or(&empty);
    let benchmark = object(obj, "industryBenchmark").unwrap_or(&empty);
    let reading = object(obj, "estimatedReading").unwrap_or(&empty);

    let relevant_keywords = strings(
        keywords,
        "relevantKeywords",
        &d.keyword_analysis.relevant_keywords,
    );
    let missing_keywords = without(
        strings(keywords, "missingKeywords", &d.keyword_analysis.missing_keywords),
        &relevant_keywords,
    );

    ResumeAnalysisResult {
        ats_score: score(obj, "atsScore", d.ats_score),
        overall_score: score(obj, "overallScore", d.overall_score),
        strengths: strings(obj, "strengths", &d.strengths),
        weaknesses: strings(obj, "weaknesses", &d.weaknesses),
        recommendations: recommendations(obj, &d.recommendations),
        skills_analysis: SkillsAnalysis {
            present_skills,
            missing_skills,
            skills_match: score(skills, "skillsMatch", d.skills_analysis.skills_match),
            industry_relevance: score(
                skills,
                "industryRelevance",
                d.skills_analysis.industry_relevance,
            ),
        },
        section_analysis: SectionAnalysis {
            contact_info: section(sections, "contactInfo", &d.section_analysis.contact_info),
            summary: section(sections, "summary", &d.section_analysis.summary),
            experience: section(sections, "experience", &d.section_analysis.experience),
            education: section(sections, "education", &d.section_analysis.education),
            skills: section(sections, "skills", &d.section_analysis.skills),
        },
        keyword_analysis: KeywordAnalysis {
            density: score(keywords, "density", d.keyword_analysis.density),
            relevant_keywords,
            missing_keywords,
        },
        formatting: Formatting {
            score: score(formatting, "score", d.formatting.score),
            issues: strings(formatting, "issues", &d.formatting.issues),
            suggestions: strings(formatting, "suggestions", &d.formatting.suggestions),
        },
        industry_benchmark: IndustryBenchmark {
            industry: text(benchmark, "industry", &d.industry_benchmark.industry),
            average_score: number(benchmark, "averageScore", d.industry_benchmark.average_score)
                .clamp(0.0, 100.0),
            percentile: number(benchmark, "percentile", d.industry_benchmark.percentile)
                .clamp(0.0, 100.0),
        },
        estimated_reading: EstimatedReading {
            time_seconds: number(reading, "timeSeconds", d.estimated_reading.time_seconds)
                .clamp(0.0, MAX_READING_SECONDS),
            difficulty: label(reading, "difficulty")
                .and_then(ReadingDifficulty::parse_label)
                .unwrap_or(d.estimated_reading.difficulty),
        },
    }
}

fn recommendations(obj: &Object, defaults: &[Recommendation]) -> Vec<Recommendation> {
    let Some(items) = obj.get("recommendations").and_then(Value::as_array) else {
        return defaults.to_vec();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let description = label(item, "description")?.to_string();
            Some(Recommendation {
                category: text(item, "category", "General"),
                priority: label(item, "priority")
                    .and_then(Priority::parse_label)
                    .unwrap_or(Priority::Medium),
                description,
                impact: score(item, "impact", 50),
            })
        })
        .collect()
}

fn section(sections: &Object, key: &str, default: &SectionScore) -> SectionScore {
    match object(sections, key) {
        Some(s) => SectionScore {
            score: score(s, "score", default.score),
            feedback: text(s, "feedback", &default.feedback),
        },
        None => default.clone(),
    }
}

fn object<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    obj.get(key).and_then(Value::as_object)
}

/// A non-blank string field.
fn label<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn text(obj: &Object, key: &str, default: &str) -> String {
    label(obj, key).unwrap_or(default).to_string()
}

/// Accepts JSON numbers and numeric strings such as `"72"` or `"72%"`.
fn raw_number(obj: &Object, key: &str) -> Option<f64> {
    let n: Option<f64> = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn number(obj: &Object, key: &str, default: f64) -> f64 {
    raw_number(obj, key).unwrap_or(default)
}

fn score(obj: &Object, key: &str, default: u8) -> u8 {
    raw_number(obj, key).map(clamp_score).unwrap_or(default)
}

/// String arrays keep non-blank strings, deduplicated ignoring case, in order.
fn strings(obj: &Object, key: &str, default: &[String]) -> Vec<String> {
    let Some(items) = obj.get(key).and_then(Value::as_array) else {
        return default.to_vec();
    };

    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items.iter().filter_map(Value::as_str).map(str::trim) {
        if !item.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(item)) {
            out.push(item.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::heuristic::heuristic_analysis;
    use serde_json::json;

    fn defaults() -> ResumeAnalysisResult {
        heuristic_analysis("jane@example.com Experience at Acme", "analyst")
    }

    fn full_response() -> Value {
        json!({
            "atsScore": 91,
            "overallScore": 88,
            "strengths": ["Strong impact metrics"],
            "weaknesses": ["Summary is generic"],
            "recommendations": [
                {"category": "Summary", "priority": "High", "description": "Rewrite the summary", "impact": 80}
            ],
            "skillsAnalysis": {
                "presentSkills": ["SQL", "Tableau"],
                "missingSkills": ["dbt"],
                "skillsMatch": 77,
                "industryRelevance": 83
            },
            "sectionAnalysis": {
                "contactInfo": {"score": 95, "feedback": "Complete"},
                "summary": {"score": 60, "feedback": "Generic"},
                "experience": {"score": 90, "feedback": "Quantified"},
                "education": {"score": 85, "feedback": "Fine"},
                "skills": {"score": 80, "feedback": "Relevant"}
            },
            "keywordAnalysis": {"density": 70, "relevantKeywords": ["SQL"], "missingKeywords": ["ETL"]},
            "formatting": {"score": 88, "issues": [], "suggestions": ["Use bullets"]},
            "industryBenchmark": {"industry": "Analytics", "averageScore": 68.5, "percentile": 82},
            "estimatedReading": {"timeSeconds": 75, "difficulty": "medium"}
        })
    }

    #[test]
    fn test_complete_response_passes_through() {
        let raw = full_response().to_string();
        let result = normalize_provider_output(&raw, &defaults()).unwrap();
        assert_eq!(result.ats_score, 91);
        assert_eq!(result.overall_score, 88);
        assert_eq!(result.recommendations[0].priority, Priority::High);
        assert_eq!(result.skills_analysis.present_skills, vec!["SQL", "Tableau"]);
        assert_eq!(result.section_analysis.contact_info.score, 95);
        assert_eq!(result.industry_benchmark.industry, "Analytics");
        assert!((result.industry_benchmark.average_score - 68.5).abs() < 1e-9);
        assert_eq!(result.estimated_reading.difficulty, ReadingDifficulty::Medium);
        assert!(result.formatting.issues.is_empty());
    }

    #[test]
    fn test_fenced_response_is_accepted() {
        let raw = format!("```json\n{}\n```", full_response());
        assert!(normalize_provider_output(&raw, &defaults()).is_ok());
    }

    #[test]
    fn test_truncated_json_is_malformed() {
        let raw = full_response().to_string();
        let truncated = &raw[..raw.len() / 2];
        assert!(matches!(
            normalize_provider_output(truncated, &defaults()),
            Err(MalformedOutput::Syntax(_))
        ));
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        assert!(matches!(
            normalize_provider_output("[1, 2, 3]", &defaults()),
            Err(MalformedOutput::NotAnObject)
        ));
        assert!(matches!(
            normalize_provider_output("\"sure, here is your analysis\"", &defaults()),
            Err(MalformedOutput::NotAnObject)
        ));
    }

    #[test]
    fn test_object_without_analysis_fields_is_malformed() {
        for raw in ["{}", r#"{"error": "model overloaded"}"#, r#"{"ats_score": 80}"#] {
            assert!(matches!(
                normalize_provider_output(raw, &defaults()),
                Err(MalformedOutput::MissingSchema)
            ));
        }
    }

    #[test]
    fn test_reading_time_is_bounded() {
        let raw = json!({"estimatedReading": {"timeSeconds": 1e300}}).to_string();
        let result = normalize_provider_output(&raw, &defaults()).unwrap();
        assert_eq!(result.estimated_reading.time_seconds, MAX_READING_SECONDS);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let raw = json!({
            "atsScore": 140,
            "overallScore": -5,
            "skillsAnalysis": {"skillsMatch": "85%"},
            "industryBenchmark": {"percentile": 250},
            "estimatedReading": {"timeSeconds": -10}
        })
        .to_string();
        let result = normalize_provider_output(&raw, &defaults()).unwrap();
        assert_eq!(result.ats_score, 100);
        assert_eq!(result.overall_score, 0);
        assert_eq!(result.skills_analysis.skills_match, 85);
        assert_eq!(result.industry_benchmark.percentile, 100.0);
        assert_eq!(result.estimated_reading.time_seconds, 0.0);
    }

    #[test]
    fn test_missing_and_wrong_typed_fields_take_defaults() {
        let d = defaults();
        let raw = json!({
            "atsScore": "excellent",
            "strengths": "not a list",
            "sectionAnalysis": {"summary": {"score": 55}},
            "estimatedReading": {"difficulty": "brutal"}
        })
        .to_string();
        let result = normalize_provider_output(&raw, &d).unwrap();
        assert_eq!(result.ats_score, d.ats_score);
        assert_eq!(result.overall_score, d.overall_score);
        assert_eq!(result.strengths, d.strengths);
        assert_eq!(result.section_analysis.summary.score, 55);
        assert_eq!(
            result.section_analysis.summary.feedback,
            d.section_analysis.summary.feedback
        );
        assert_eq!(result.section_analysis.skills, d.section_analysis.skills);
        assert_eq!(result.estimated_reading.difficulty, d.estimated_reading.difficulty);
        assert_eq!(result.industry_benchmark, d.industry_benchmark);
    }

    #[test]
    fn test_overlapping_skills_are_made_disjoint() {
        let raw = json!({
            "skillsAnalysis": {
                "presentSkills": ["Python", "SQL", "python"],
                "missingSkills": ["sql", "Kubernetes", ""]
            }
        })
        .to_string();
        let result = normalize_provider_output(&raw, &defaults()).unwrap();
        assert_eq!(result.skills_analysis.present_skills, vec!["Python", "SQL"]);
        assert_eq!(result.skills_analysis.missing_skills, vec!["Kubernetes"]);
    }

    #[test]
    fn test_recommendations_without_description_are_dropped() {
        let raw = json!({
            "recommendations": [
                {"category": "Skills", "priority": "urgent", "impact": 300, "description": "Add dbt"},
                {"category": "Noise", "priority": "low"},
                "not an object"
            ]
        })
        .to_string();
        let result = normalize_provider_output(&raw, &defaults()).unwrap();
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].priority, Priority::Medium);
        assert_eq!(result.recommendations[0].impact, 100);
    }
}
