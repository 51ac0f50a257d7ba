//! Caller-side persistence of a finished analysis.
//!
//! The analysis record itself must be saved. Trend and aggregate bookkeeping
//! that follows is best-effort: failures are logged and swallowed so they
//! never undo an analysis the user already has.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::analysis::ResumeAnalysisRow;
use crate::store::{AnalysisStore, NewAnalysis};

pub async fn record_analysis(
    store: &dyn AnalysisStore,
    new: NewAnalysis<'_>,
) -> Result<ResumeAnalysisRow, AppError> {
    let tier = new.tier;
    let row = store.insert_analysis(new).await?;
    info!(
        "Saved analysis {} for user {} (tier: {}, ats: {}, overall: {})",
        row.id,
        row.user_id,
        tier.as_str(),
        row.ats_score,
        row.overall_score
    );

    if let Err(e) = store.insert_trend(&row).await {
        warn!("Failed to record score trend for analysis {}: {e:#}", row.id);
    }

    if let Err(e) = store
        .upsert_user_analytics(row.user_id, row.ats_score, row.overall_score)
        .await
    {
        warn!("Failed to update analytics for user {}: {e:#}", row.user_id);
    }

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::heuristic::heuristic_analysis;
    use crate::analysis::synthesizer::Tier;
    use crate::store::memory::MemoryStore;
    use std::sync::atomic::Ordering;
    use uuid::Uuid;

    fn new_analysis<'a>(
        user_id: Uuid,
        result: &'a crate::analysis::models::ResumeAnalysisResult,
    ) -> NewAnalysis<'a> {
        NewAnalysis {
            user_id,
            job_role: "analyst",
            analysis_type: "comprehensive",
            result,
            tier: Tier::Heuristic,
        }
    }

    #[tokio::test]
    async fn test_records_analysis_trend_and_analytics() {
        let store = MemoryStore::default();
        let user_id = Uuid::new_v4();
        let result = heuristic_analysis("jane@example.com Experience at Acme", "analyst");

        let row = record_analysis(&store, new_analysis(user_id, &result))
            .await
            .unwrap();
        assert_eq!(row.ats_score, i32::from(result.ats_score));
        assert_eq!(row.source_tier, "heuristic");
        assert_eq!(store.trend_count(), 1);

        let analytics = store.get_user_analytics(user_id).await.unwrap().unwrap();
        assert_eq!(analytics.total_analyses, 1);
        assert_eq!(analytics.current_overall_score, i32::from(result.overall_score));
    }

    #[tokio::test]
    async fn test_second_analysis_shifts_previous_scores() {
        let store = MemoryStore::default();
        let user_id = Uuid::new_v4();
        let first = heuristic_analysis("just a few words", "analyst");
        let second = heuristic_analysis("jane@example.com 555-123-4567 Experience", "analyst");

        record_analysis(&store, new_analysis(user_id, &first)).await.unwrap();
        record_analysis(&store, new_analysis(user_id, &second)).await.unwrap();

        let analytics = store.get_user_analytics(user_id).await.unwrap().unwrap();
        assert_eq!(analytics.total_analyses, 2);
        assert_eq!(analytics.previous_ats_score, Some(i32::from(first.ats_score)));
        assert_eq!(analytics.current_ats_score, i32::from(second.ats_score));
    }

    #[tokio::test]
    async fn test_bookkeeping_failure_is_swallowed() {
        let store = MemoryStore::default();
        store.fail_bookkeeping.store(true, Ordering::SeqCst);
        let user_id = Uuid::new_v4();
        let result = heuristic_analysis("jane@example.com Experience at Acme", "analyst");

        let row = record_analysis(&store, new_analysis(user_id, &result)).await;
        assert!(row.is_ok());
        assert_eq!(store.trend_count(), 0);
        assert!(store.get_user_analytics(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_analysis_insert_failure_propagates() {
        let store = MemoryStore::default();
        store.fail_analyses.store(true, Ordering::SeqCst);
        let result = heuristic_analysis("jane@example.com Experience at Acme", "analyst");

        let err = record_analysis(&store, new_analysis(Uuid::new_v4(), &result))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
