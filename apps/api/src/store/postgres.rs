use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::analysis::{ResumeAnalysisRow, ScoreTrendRow, UserAnalyticsRow};
use crate::store::{AnalysisStore, NewAnalysis};

#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn insert_analysis(&self, new: NewAnalysis<'_>) -> Result<ResumeAnalysisRow> {
        let result = serde_json::to_value(new.result).context("serializing analysis result")?;

        // Append-only: analyses are never updated
        let row = sqlx::query_as::<_, ResumeAnalysisRow>(
            r#"
            INSERT INTO resume_analyses
                (id, user_id, job_role, analysis_type, ats_score, overall_score, result, source_tier)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.job_role)
        .bind(new.analysis_type)
        .bind(i32::from(new.result.ats_score))
        .bind(i32::from(new.result.overall_score))
        .bind(result)
        .bind(new.tier.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_trend(&self, analysis: &ResumeAnalysisRow) -> Result<ScoreTrendRow> {
        let row = sqlx::query_as::<_, ScoreTrendRow>(
            r#"
            INSERT INTO score_trends (id, user_id, analysis_id, ats_score, overall_score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(analysis.user_id)
        .bind(analysis.id)
        .bind(analysis.ats_score)
        .bind(analysis.overall_score)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert_user_analytics(
        &self,
        user_id: Uuid,
        ats_score: i32,
        overall_score: i32,
    ) -> Result<UserAnalyticsRow> {
        // Single statement: SET expressions read the pre-update row, so
        // previous := current and current := new happen together.
        let row = sqlx::query_as::<_, UserAnalyticsRow>(
            r#"
            INSERT INTO user_analytics
                (user_id, current_ats_score, previous_ats_score, current_overall_score,
                 previous_overall_score, total_analyses, score_sum, best_overall_score, updated_at)
            VALUES ($1, $2, NULL, $3, NULL, 1, $3, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                previous_ats_score     = user_analytics.current_ats_score,
                current_ats_score      = EXCLUDED.current_ats_score,
                previous_overall_score = user_analytics.current_overall_score,
                current_overall_score  = EXCLUDED.current_overall_score,
                total_analyses         = user_analytics.total_analyses + 1,
                score_sum              = user_analytics.score_sum + EXCLUDED.current_overall_score,
                best_overall_score     = GREATEST(user_analytics.best_overall_score,
                                                  EXCLUDED.current_overall_score),
                updated_at             = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(ats_score)
        .bind(overall_score)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_analysis(
        &self,
        user_id: Uuid,
        analysis_id: Uuid,
    ) -> Result<Option<ResumeAnalysisRow>> {
        let row = sqlx::query_as::<_, ResumeAnalysisRow>(
            "SELECT * FROM resume_analyses WHERE id = $1 AND user_id = $2",
        )
        .bind(analysis_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_analyses(&self, user_id: Uuid, limit: i64) -> Result<Vec<ResumeAnalysisRow>> {
        let rows = sqlx::query_as::<_, ResumeAnalysisRow>(
            "SELECT * FROM resume_analyses WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_user_analytics(&self, user_id: Uuid) -> Result<Option<UserAnalyticsRow>> {
        let row = sqlx::query_as::<_, UserAnalyticsRow>(
            "SELECT * FROM user_analytics WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_trends(&self, user_id: Uuid, limit: i64) -> Result<Vec<ScoreTrendRow>> {
        let rows = sqlx::query_as::<_, ScoreTrendRow>(
            "SELECT * FROM score_trends WHERE user_id = $1 ORDER BY recorded_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
