//! Heuristic analysis: deterministic, network-free scoring from regex and
//! keyword detectors. Used as the availability floor when no provider answers.
//!
//! Scores are capped below what a provider may return: `ats_score <= 85` and
//! `overall_score <= 80`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::models::{
    clamp_score, EstimatedReading, Formatting, IndustryBenchmark, KeywordAnalysis, Priority,
    ReadingDifficulty, Recommendation, ResumeAnalysisResult, SectionAnalysis, SectionScore,
    SkillsAnalysis,
};

pub const DEFAULT_JOB_ROLE: &str = "general";
pub const ATS_CEILING: u8 = 85;
pub const OVERALL_CEILING: u8 = 80;
const BENCHMARK_AVERAGE: f64 = 65.0;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex");
    static ref PHONE: Regex =
        Regex::new(r"(?:\+?\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}")
            .expect("phone regex");
    static ref EXPERIENCE: Regex = Regex::new(
        r"(?i)\b(?:experience|employment|work history|professional history|internships?)\b"
    )
    .expect("experience regex");
    static ref EDUCATION: Regex = Regex::new(
        r"(?i)\b(?:education|degree|university|college|bachelor'?s?|master'?s?|ph\.?d|diploma)\b"
    )
    .expect("education regex");
    static ref SKILLS: Regex =
        Regex::new(r"(?i)\b(?:skills?|technologies|competencies|proficien(?:t|cy))\b")
            .expect("skills regex");
    static ref SUMMARY: Regex =
        Regex::new(r"(?i)\b(?:summary|objective|profile|about me)\b").expect("summary regex");
    static ref COMMON_SKILLS: Vec<(&'static str, Regex)> = [
        ("Communication", r"(?i)\bcommunication\b"),
        ("Leadership", r"(?i)\bleadership\b"),
        ("Teamwork", r"(?i)\bteam ?work\b"),
        ("Problem Solving", r"(?i)\bproblem[ -]solving\b"),
        ("Project Management", r"(?i)\bproject management\b"),
        ("Data Analysis", r"(?i)\bdata analysis\b"),
        ("Customer Service", r"(?i)\bcustomer service\b"),
        ("Python", r"(?i)\bpython\b"),
        ("Java", r"(?i)\bjava\b"),
        ("JavaScript", r"(?i)\bjavascript\b"),
        ("SQL", r"(?i)\bsql\b"),
        ("Excel", r"(?i)\bexcel\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("skill regex")))
    .collect();
}

/// Boolean detectors and counts extracted from resume text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeSignals {
    pub has_email: bool,
    pub has_phone: bool,
    pub has_experience: bool,
    pub has_education: bool,
    pub has_skills: bool,
    pub has_summary: bool,
    pub word_count: usize,
    pub present_skills: Vec<String>,
}

impl ResumeSignals {
    pub fn detect(text: &str) -> Self {
        Self {
            has_email: EMAIL.is_match(text),
            has_phone: PHONE.is_match(text),
            has_experience: EXPERIENCE.is_match(text),
            has_education: EDUCATION.is_match(text),
            has_skills: SKILLS.is_match(text),
            has_summary: SUMMARY.is_match(text),
            word_count: text.split_whitespace().count(),
            present_skills: COMMON_SKILLS
                .iter()
                .filter(|(_, re)| re.is_match(text))
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }

    fn is_detailed(&self) -> bool {
        self.word_count > 200
    }
}

/// Blank or missing job roles analyze as `"general"`.
pub fn normalize_job_role(job_role: Option<&str>) -> String {
    job_role
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_JOB_ROLE)
        .to_string()
}

pub fn heuristic_analysis(resume_text: &str, job_role: &str) -> ResumeAnalysisResult {
    let role = normalize_job_role(Some(job_role));
    let signals = ResumeSignals::detect(resume_text);
    let ats_score = ats_score(&signals);
    let overall_score = overall_score(&signals);

    ResumeAnalysisResult {
        ats_score,
        overall_score,
        strengths: strengths(&signals),
        weaknesses: weaknesses(&signals),
        recommendations: recommendations(&signals, &role),
        skills_analysis: skills_analysis(&signals, &role),
        section_analysis: section_analysis(&signals),
        keyword_analysis: keyword_analysis(&signals, &role),
        formatting: formatting(&signals),
        industry_benchmark: IndustryBenchmark {
            industry: role,
            average_score: BENCHMARK_AVERAGE,
            percentile: (50.0 + (overall_score as f64 - BENCHMARK_AVERAGE) * 2.0).clamp(1.0, 99.0),
        },
        estimated_reading: estimated_reading(signals.word_count),
    }
}

fn ats_score(s: &ResumeSignals) -> u8 {
    let score = 60
        + 5 * u8::from(s.has_email)
        + 5 * u8::from(s.has_phone)
        + 10 * u8::from(s.has_experience)
        + 5 * u8::from(s.has_education);
    score.min(ATS_CEILING)
}

fn overall_score(s: &ResumeSignals) -> u8 {
    let score = 50
        + 15 * u8::from(s.is_detailed())
        + 10 * u8::from(s.has_skills)
        + 15 * u8::from(s.has_experience);
    score.min(OVERALL_CEILING)
}

fn strengths(s: &ResumeSignals) -> Vec<String> {
    [
        (s.has_email || s.has_phone, "Contact information is clearly provided"),
        (s.has_experience, "Work experience section is present"),
        (s.has_education, "Education background is included"),
        (s.has_skills, "Skills section highlights your competencies"),
        (s.has_summary, "Opens with a professional summary"),
        (s.is_detailed(), "Resume provides a good level of detail"),
    ]
    .into_iter()
    .filter(|(detected, _)| *detected)
    .map(|(_, sentence)| sentence.to_string())
    .collect()
}

fn weaknesses(s: &ResumeSignals) -> Vec<String> {
    [
        (s.has_email, "No email address found in contact information"),
        (s.has_phone, "No phone number found in contact information"),
        (s.has_experience, "Work experience section is missing or unclear"),
        (s.has_education, "Education section is missing or unclear"),
        (s.has_skills, "No dedicated skills section found"),
        (s.has_summary, "No professional summary at the top of the resume"),
        (s.is_detailed(), "Resume content is brief and may lack detail"),
    ]
    .into_iter()
    .filter(|(detected, _)| !*detected)
    .map(|(_, sentence)| sentence.to_string())
    .collect()
}

fn recommendations(s: &ResumeSignals, role: &str) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let mut push = |category: &str, priority: Priority, description: String, impact: u8| {
        recs.push(Recommendation {
            category: category.to_string(),
            priority,
            description,
            impact,
        })
    };

    if !s.has_experience {
        push(
            "Experience",
            Priority::High,
            "Describe your work experience with measurable achievements".to_string(),
            90,
        );
    }
    if !s.has_skills {
        push(
            "Skills",
            Priority::High,
            format!("Add a dedicated skills section listing key {role} skills"),
            85,
        );
    }
    if !(s.has_email && s.has_phone) {
        push(
            "Contact Information",
            Priority::High,
            "Include both an email address and a phone number".to_string(),
            70,
        );
    }
    if !s.has_education {
        push(
            "Education",
            Priority::Medium,
            "Add your education, degrees and certifications".to_string(),
            60,
        );
    }
    if !s.is_detailed() {
        push(
            "Content",
            Priority::Medium,
            "Expand on responsibilities and results for each role".to_string(),
            65,
        );
    }
    if !s.has_summary {
        push(
            "Summary",
            Priority::Low,
            format!("Open with a short professional summary targeted at {role} roles"),
            50,
        );
    }
    push(
        "Keywords",
        Priority::Medium,
        format!("Tailor keywords to {role} job descriptions to improve ATS matching"),
        75,
    );
    recs
}

fn skills_analysis(s: &ResumeSignals, role: &str) -> SkillsAnalysis {
    let present_skills = s.present_skills.clone();
    let missing_skills = without(
        vec![
            format!("Key {role} skills"),
            format!("{role} tools and technologies"),
        ],
        &present_skills,
    );
    let listed = s.present_skills.len().min(6) as f64;

    SkillsAnalysis {
        present_skills,
        missing_skills,
        skills_match: clamp_score(40.0 + 20.0 * f64::from(u8::from(s.has_skills)) + 5.0 * listed),
        industry_relevance: 50
            + 15 * u8::from(s.has_experience)
            + 10 * u8::from(s.has_skills),
    }
}

fn section_analysis(s: &ResumeSignals) -> SectionAnalysis {
    let contact_feedback = match (s.has_email, s.has_phone) {
        (true, true) => "Email and phone number are both present",
        (true, false) => "Add a phone number so recruiters can reach you",
        (false, true) => "Add a professional email address",
        (false, false) => "Add an email address and phone number",
    };

    SectionAnalysis {
        contact_info: SectionScore {
            score: 40 + 30 * u8::from(s.has_email) + 30 * u8::from(s.has_phone),
            feedback: contact_feedback.to_string(),
        },
        summary: section(
            s.has_summary,
            75,
            40,
            "Professional summary found",
            "Consider adding a brief professional summary",
        ),
        experience: section(
            s.has_experience,
            80,
            30,
            "Experience section detected",
            "Add a clearly labelled work experience section",
        ),
        education: section(
            s.has_education,
            80,
            35,
            "Education section detected",
            "Add a clearly labelled education section",
        ),
        skills: section(
            s.has_skills,
            80,
            30,
            "Skills section detected",
            "Add a clearly labelled skills section",
        ),
    }
}

fn section(detected: bool, hit: u8, miss: u8, found: &str, missing: &str) -> SectionScore {
    if detected {
        SectionScore {
            score: hit,
            feedback: found.to_string(),
        }
    } else {
        SectionScore {
            score: miss,
            feedback: missing.to_string(),
        }
    }
}

fn keyword_analysis(s: &ResumeSignals, role: &str) -> KeywordAnalysis {
    let relevant_keywords = s.present_skills.clone();
    let missing_keywords = without(
        vec![
            format!("{role} certifications"),
            format!("{role} industry terminology"),
        ],
        &relevant_keywords,
    );

    KeywordAnalysis {
        density: clamp_score(20.0 + 10.0 * relevant_keywords.len() as f64),
        relevant_keywords,
        missing_keywords,
    }
}

fn formatting(s: &ResumeSignals) -> Formatting {
    let mut issues = Vec::new();
    if s.word_count < 150 {
        issues.push("Resume appears too short for a complete profile".to_string());
    }
    if s.word_count > 1000 {
        issues.push("Resume may be too long for a quick screen".to_string());
    }
    if !(s.has_experience || s.has_education || s.has_skills) {
        issues.push("Standard section headings were not detected".to_string());
    }

    Formatting {
        score: clamp_score(80.0 - 15.0 * issues.len() as f64),
        issues,
        suggestions: vec![
            "Use consistent bullet points for achievements".to_string(),
            "Keep standard section headings so ATS parsers can find them".to_string(),
        ],
    }
}

fn estimated_reading(word_count: usize) -> EstimatedReading {
    EstimatedReading {
        time_seconds: (word_count as f64 * 0.2).clamp(30.0, 120.0),
        difficulty: if word_count > 400 {
            ReadingDifficulty::Medium
        } else {
            ReadingDifficulty::Easy
        },
    }
}

/// Drops entries of `items` that also appear in `exclude`, ignoring case.
pub fn without(items: Vec<String>, exclude: &[String]) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| !exclude.iter().any(|e| e.eq_ignore_ascii_case(item)))
        .collect()
}
