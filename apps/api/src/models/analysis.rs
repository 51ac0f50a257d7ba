use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable analysis record. Re-analysis inserts a new row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeAnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_role: String,
    pub analysis_type: String,
    pub ats_score: i32,
    pub overall_score: i32,
    pub result: Value,
    /// Which fallback tier produced `result`. Diagnostic only.
    pub source_tier: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoreTrendRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub analysis_id: Uuid,
    pub ats_score: i32,
    pub overall_score: i32,
    pub recorded_at: DateTime<Utc>,
}

/// Per-user running aggregate, updated once per new analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserAnalyticsRow {
    pub user_id: Uuid,
    pub current_ats_score: i32,
    pub previous_ats_score: Option<i32>,
    pub current_overall_score: i32,
    pub previous_overall_score: Option<i32>,
    pub total_analyses: i64,
    pub score_sum: i64,
    pub best_overall_score: i32,
    pub updated_at: DateTime<Utc>,
}

impl UserAnalyticsRow {
    /// Folds a new analysis into the aggregate: current scores move to the
    /// `previous_*` fields and counters advance. The Postgres upsert applies
    /// the same rule in a single statement.
    pub fn fold(
        existing: Option<&Self>,
        user_id: Uuid,
        ats_score: i32,
        overall_score: i32,
        now: DateTime<Utc>,
    ) -> Self {
        match existing {
            None => Self {
                user_id,
                current_ats_score: ats_score,
                previous_ats_score: None,
                current_overall_score: overall_score,
                previous_overall_score: None,
                total_analyses: 1,
                score_sum: i64::from(overall_score),
                best_overall_score: overall_score,
                updated_at: now,
            },
            Some(prev) => Self {
                user_id,
                current_ats_score: ats_score,
                previous_ats_score: Some(prev.current_ats_score),
                current_overall_score: overall_score,
                previous_overall_score: Some(prev.current_overall_score),
                total_analyses: prev.total_analyses + 1,
                score_sum: prev.score_sum + i64::from(overall_score),
                best_overall_score: prev.best_overall_score.max(overall_score),
                updated_at: now,
            },
        }
    }

    pub fn average_overall_score(&self) -> f64 {
        if self.total_analyses == 0 {
            return 0.0;
        }
        self.score_sum as f64 / self.total_analyses as f64
    }

    /// Change in overall score since the previous analysis, if there was one.
    pub fn overall_delta(&self) -> Option<i32> {
        self.previous_overall_score
            .map(|prev| self.current_overall_score - prev)
    }
}
