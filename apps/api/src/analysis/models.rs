//! The structured analysis result. Field names serialize as camelCase, which
//! is also the schema the providers are asked to answer in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDifficulty {
    Easy,
    Medium,
    Hard,
}

impl ReadingDifficulty {
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub priority: Priority,
    pub description: String,
    pub impact: u8, // 0..=100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsAnalysis {
    pub present_skills: Vec<String>,
    /// Never overlaps `present_skills`.
    pub missing_skills: Vec<String>,
    pub skills_match: u8,
    pub industry_relevance: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAnalysis {
    pub contact_info: SectionScore,
    pub summary: SectionScore,
    pub experience: SectionScore,
    pub education: SectionScore,
    pub skills: SectionScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordAnalysis {
    pub density: u8,
    pub relevant_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formatting {
    pub score: u8,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryBenchmark {
    pub industry: String,
    pub average_score: f64,
    pub percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedReading {
    pub time_seconds: f64,
    pub difficulty: ReadingDifficulty,
}

/// Complete analysis of one resume. Every field is always populated,
/// whichever tier produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisResult {
    pub ats_score: u8,
    pub overall_score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub skills_analysis: SkillsAnalysis,
    pub section_analysis: SectionAnalysis,
    pub keyword_analysis: KeywordAnalysis,
    pub formatting: Formatting,
    pub industry_benchmark: IndustryBenchmark,
    pub estimated_reading: EstimatedReading,
}

impl ResumeAnalysisResult {
    /// All 0..=100 integer scores, for range checks.
    pub fn scores(&self) -> Vec<u8> {
        let sections = &self.section_analysis;
        let mut scores = vec![
            self.ats_score,
            self.overall_score,
            self.skills_analysis.skills_match,
            self.skills_analysis.industry_relevance,
            sections.contact_info.score,
            sections.summary.score,
            sections.experience.score,
            sections.education.score,
            sections.skills.score,
            self.keyword_analysis.density,
            self.formatting.score,
        ];
        scores.extend(self.recommendations.iter().map(|r| r.impact));
        scores
    }
}

/// Clamps a raw number into `[0, 100]`, rounding to the nearest integer.
pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
