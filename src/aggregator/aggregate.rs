//! Result aggregation
//!
//! Pure merge of a retrieval outcome and task results into the final report.
//! Status rule:
//! - FAILED when retrieval did not succeed or returned zero passages
//! - SUCCESS when every mandatory task ran and succeeded and no other
//!   submitted task failed or timed out
//! - PARTIAL otherwise

use crate::aggregator::report::{AggregateReport, OverallStatus, ReportMeta, TaskResults};
use crate::enrichment::TaskName;
use crate::errors::ErrorKind;
use crate::retrieval::RetrievalOutcome;

/// Merge outcomes into an [`AggregateReport`]
///
/// Deterministic: identical inputs give identical reports.
pub fn aggregate(retrieval: RetrievalOutcome, results: TaskResults, meta: ReportMeta) -> AggregateReport {
    let (overall_status, failure_kind, failure_reason) = classify(&retrieval, &results);

    let tasks_completed = if overall_status == OverallStatus::Failed {
        Vec::new()
    } else {
        results
            .iter()
            .filter(|r| r.succeeded)
            .map(|r| r.task_name)
            .collect()
    };

    AggregateReport {
        request_id: meta.request_id,
        timestamp: meta.timestamp,
        query: retrieval.query.clone(),
        retrieval,
        results,
        tasks_completed,
        overall_status,
        failure_kind,
        failure_reason,
        total_elapsed_ms: meta.total_elapsed.as_millis() as u64,
    }
}

fn classify(
    retrieval: &RetrievalOutcome,
    results: &TaskResults,
) -> (OverallStatus, Option<ErrorKind>, Option<String>) {
    if !retrieval.succeeded {
        let kind = retrieval.error_kind.unwrap_or(ErrorKind::RetrievalUnavailable);
        let reason = retrieval
            .error
            .clone()
            .unwrap_or_else(|| format!("Retrieval failed: {}", kind));
        return (OverallStatus::Failed, Some(kind), Some(reason));
    }

    if retrieval.is_empty() {
        return (
            OverallStatus::Failed,
            Some(ErrorKind::EmptyRetrieval),
            Some(format!("No passages matched the query \"{}\"", retrieval.query)),
        );
    }

    let mandatory_ok = TaskName::ALL
        .iter()
        .filter(|name| name.is_mandatory())
        .all(|name| results.get(*name).map_or(false, |r| r.succeeded));
    let all_ok = results.iter().all(|r| r.succeeded);

    if mandatory_ok && all_ok {
        (OverallStatus::Success, None, None)
    } else {
        (OverallStatus::Partial, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{EnrichmentResult, TaskPayload};
    use crate::retrieval::RetrievedPassage;
    use chrono::TimeZone;
    use quickcheck_macros::quickcheck;
    use std::time::Duration;
    use uuid::Uuid;

    fn meta() -> ReportMeta {
        ReportMeta {
            request_id: Uuid::nil(),
            timestamp: chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            total_elapsed: Duration::from_millis(1200),
        }
    }

    fn retrieval(passages: usize) -> RetrievalOutcome {
        let passages = (0..passages)
            .map(|i| RetrievedPassage {
                text: format!("passage {}", i),
                source_id: "guide.pdf".to_string(),
                relevance_score: 1.0 - i as f32 * 0.1,
                chunk_index: i as i64,
            })
            .collect();
        RetrievalOutcome::success("What causes early regression?", passages, Duration::from_millis(40))
    }

    fn ok(name: TaskName) -> EnrichmentResult {
        EnrichmentResult::success(
            name,
            TaskPayload::Image {
                prompt: String::new(),
                byte_len: 0,
                path: None,
                bytes: bytes::Bytes::new(),
            },
            Duration::from_millis(10),
        )
    }

    fn failed(name: TaskName) -> EnrichmentResult {
        EnrichmentResult::failure(name, ErrorKind::ProducerError, "boom", Duration::from_millis(10))
    }

    #[test]
    fn test_success_when_mandatory_succeeds() {
        let results: TaskResults = vec![ok(TaskName::Simplify)].into_iter().collect();
        let report = aggregate(retrieval(3), results, meta());

        assert_eq!(report.overall_status, OverallStatus::Success);
        assert_eq!(report.tasks_completed, vec![TaskName::Simplify]);
        assert!(report.failure_kind.is_none());
        assert_eq!(report.total_elapsed_ms, 1200);
        assert_eq!(report.query, "What causes early regression?");
    }

    #[test]
    fn test_optional_failure_is_partial() {
        let results: TaskResults = vec![failed(TaskName::Image), ok(TaskName::Simplify)]
            .into_iter()
            .collect();
        let report = aggregate(retrieval(2), results, meta());

        assert_eq!(report.overall_status, OverallStatus::Partial);
        assert_eq!(report.tasks_completed, vec![TaskName::Simplify]);
        assert_eq!(report.failed_tasks().len(), 1);
    }

    #[test]
    fn test_partial_when_mandatory_fails() {
        let results: TaskResults = vec![ok(TaskName::Story), failed(TaskName::Simplify)]
            .into_iter()
            .collect();
        let report = aggregate(retrieval(2), results, meta());

        assert_eq!(report.overall_status, OverallStatus::Partial);
        assert_eq!(report.tasks_completed, vec![TaskName::Story]);
    }

    #[test]
    fn test_partial_when_mandatory_missing() {
        let report = aggregate(retrieval(1), TaskResults::new(), meta());
        assert_eq!(report.overall_status, OverallStatus::Partial);
    }

    #[test]
    fn test_empty_retrieval_is_failed() {
        let report = aggregate(retrieval(0), TaskResults::new(), meta());

        assert_eq!(report.overall_status, OverallStatus::Failed);
        assert_eq!(report.failure_kind, Some(ErrorKind::EmptyRetrieval));
        assert!(report.tasks_completed.is_empty());
        assert!(report.failure_reason.unwrap().contains("What causes early regression?"));
    }

    #[test]
    fn test_unavailable_retrieval_is_failed() {
        let outcome = RetrievalOutcome::failure(
            "q",
            ErrorKind::RetrievalUnavailable,
            "Embedding failed: connection refused",
            Duration::ZERO,
        );
        let report = aggregate(outcome, TaskResults::new(), meta());

        assert_eq!(report.overall_status, OverallStatus::Failed);
        assert_eq!(report.failure_kind, Some(ErrorKind::RetrievalUnavailable));
        assert_eq!(
            report.failure_reason.as_deref(),
            Some("Embedding failed: connection refused")
        );
    }

    #[test]
    fn test_completion_order_preserved() {
        let results: TaskResults = vec![ok(TaskName::Image), ok(TaskName::Story), ok(TaskName::Simplify)]
            .into_iter()
            .collect();
        let report = aggregate(retrieval(1), results, meta());

        assert_eq!(
            report.tasks_completed,
            vec![TaskName::Image, TaskName::Story, TaskName::Simplify]
        );
        assert_eq!(report.results.names(), report.tasks_completed);
    }

    #[quickcheck]
    fn prop_aggregate_is_deterministic(passages: u8, outcomes: Vec<(u8, bool)>) -> bool {
        let results: TaskResults = outcomes
            .iter()
            .map(|(i, succeeded)| {
                let name = TaskName::ALL[*i as usize % TaskName::ALL.len()];
                if *succeeded {
                    ok(name)
                } else {
                    failed(name)
                }
            })
            .collect();
        let outcome = retrieval(passages as usize % 4);

        let first = aggregate(outcome.clone(), results.clone(), meta());
        let second = aggregate(outcome, results.clone(), meta());

        let expected = if passages % 4 == 0 {
            OverallStatus::Failed
        } else if results.get(TaskName::Simplify).map_or(false, |r| r.succeeded)
            && results.iter().all(|r| r.succeeded)
        {
            OverallStatus::Success
        } else {
            OverallStatus::Partial
        };

        first == second && first.overall_status == expected
    }
}
