//! Persistence for analyses and per-user analytics.
//!
//! `AppState` holds an `Arc<dyn AnalysisStore>`; production uses
//! `PgAnalysisStore`, tests use an in-process store.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::analysis::models::ResumeAnalysisResult;
use crate::analysis::synthesizer::Tier;
use crate::models::analysis::{ResumeAnalysisRow, ScoreTrendRow, UserAnalyticsRow};

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod recorder;

pub use postgres::PgAnalysisStore;

/// Everything needed to insert a new analysis record.
pub struct NewAnalysis<'a> {
    pub user_id: Uuid,
    pub job_role: &'a str,
    pub analysis_type: &'a str,
    pub result: &'a ResumeAnalysisResult,
    pub tier: Tier,
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn insert_analysis(&self, new: NewAnalysis<'_>) -> Result<ResumeAnalysisRow>;

    async fn insert_trend(&self, analysis: &ResumeAnalysisRow) -> Result<ScoreTrendRow>;

    /// Atomically folds a new score pair into the user's aggregate.
    async fn upsert_user_analytics(
        &self,
        user_id: Uuid,
        ats_score: i32,
        overall_score: i32,
    ) -> Result<UserAnalyticsRow>;

    async fn get_analysis(&self, user_id: Uuid, analysis_id: Uuid)
        -> Result<Option<ResumeAnalysisRow>>;

    /// Newest first.
    async fn list_analyses(&self, user_id: Uuid, limit: i64) -> Result<Vec<ResumeAnalysisRow>>;

    async fn get_user_analytics(&self, user_id: Uuid) -> Result<Option<UserAnalyticsRow>>;

    /// Newest first.
    async fn list_trends(&self, user_id: Uuid, limit: i64) -> Result<Vec<ScoreTrendRow>>;
}
