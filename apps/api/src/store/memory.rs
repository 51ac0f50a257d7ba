//! In-process `AnalysisStore` for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::analysis::{ResumeAnalysisRow, ScoreTrendRow, UserAnalyticsRow};
use crate::store::{AnalysisStore, NewAnalysis};

#[derive(Default)]
pub struct MemoryStore {
    analyses: Mutex<Vec<ResumeAnalysisRow>>,
    trends: Mutex<Vec<ScoreTrendRow>>,
    analytics: Mutex<Vec<UserAnalyticsRow>>,
    pub fail_analyses: AtomicBool,
    pub fail_bookkeeping: AtomicBool,
}

impl MemoryStore {
    pub fn trend_count(&self) -> usize {
        self.trends.lock().unwrap().len()
    }
}

fn newest_first<T>(mut rows: Vec<T>, limit: i64) -> Vec<T> {
    rows.reverse();
    rows.truncate(usize::try_from(limit).unwrap_or(0));
    rows
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn insert_analysis(&self, new: NewAnalysis<'_>) -> Result<ResumeAnalysisRow> {
        if self.fail_analyses.load(Ordering::SeqCst) {
            bail!("analyses table unavailable");
        }
        let row = ResumeAnalysisRow {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            job_role: new.job_role.to_string(),
            analysis_type: new.analysis_type.to_string(),
            ats_score: i32::from(new.result.ats_score),
            overall_score: i32::from(new.result.overall_score),
            result: serde_json::to_value(new.result)?,
            source_tier: new.tier.as_str().to_string(),
            created_at: Utc::now(),
        };
        self.analyses.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn insert_trend(&self, analysis: &ResumeAnalysisRow) -> Result<ScoreTrendRow> {
        if self.fail_bookkeeping.load(Ordering::SeqCst) {
            bail!("score_trends table unavailable");
        }
        let row = ScoreTrendRow {
            id: Uuid::new_v4(),
            user_id: analysis.user_id,
            analysis_id: analysis.id,
            ats_score: analysis.ats_score,
            overall_score: analysis.overall_score,
            recorded_at: Utc::now(),
        };
        self.trends.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn upsert_user_analytics(
        &self,
        user_id: Uuid,
        ats_score: i32,
        overall_score: i32,
    ) -> Result<UserAnalyticsRow> {
        if self.fail_bookkeeping.load(Ordering::SeqCst) {
            bail!("user_analytics table unavailable");
        }
        let mut analytics = self.analytics.lock().unwrap();
        let position = analytics.iter().position(|a| a.user_id == user_id);
        let next = UserAnalyticsRow::fold(
            position.map(|i| &analytics[i]),
            user_id,
            ats_score,
            overall_score,
            Utc::now(),
        );
        match position {
            Some(i) => analytics[i] = next.clone(),
            None => analytics.push(next.clone()),
        }
        Ok(next)
    }

    async fn get_analysis(
        &self,
        user_id: Uuid,
        analysis_id: Uuid,
    ) -> Result<Option<ResumeAnalysisRow>> {
        Ok(self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == analysis_id && a.user_id == user_id)
            .cloned())
    }

    async fn list_analyses(&self, user_id: Uuid, limit: i64) -> Result<Vec<ResumeAnalysisRow>> {
        let rows = self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, limit))
    }

    async fn get_user_analytics(&self, user_id: Uuid) -> Result<Option<UserAnalyticsRow>> {
        Ok(self
            .analytics
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_trends(&self, user_id: Uuid, limit: i64) -> Result<Vec<ScoreTrendRow>> {
        let rows = self
            .trends
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, limit))
    }
}
