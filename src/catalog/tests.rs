//! Tests for batch listing, search and ledger inspection

#[cfg(test)]
mod tests {
    use crate::{
        backend::testing::{batch_record, ScriptedLedger},
        catalog::{
            BatchFilterInput, BatchLister, BatchSearcher, CriteriaEcho, FilterApplied,
            LedgerInspector, ListBatchesRequest, SearchBatchesRequest, SearchCriteriaInput,
            NO_MATCH_SUGGESTIONS, SEARCH_ERROR_SUGGESTION,
        },
        config::LedgerConfig,
        ContractInfo, ContractStats, SearchHit,
    };
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn ledger_with_batches(count: usize) -> Arc<ScriptedLedger> {
        let mut ledger = ScriptedLedger::new();
        ledger.batches = (0..count).map(|i| batch_record(&format!("BATCH-{}", i))).collect();
        Arc::new(ledger)
    }

    #[tokio::test]
    async fn test_limit_at_maximum_passes_unchanged() {
        let ledger = ledger_with_batches(3);
        let response = BatchLister::new(ledger.clone())
            .list(ListBatchesRequest {
                limit: 1000,
                ..Default::default()
            })
            .await;

        assert_eq!(response.limit, 1000);
        assert!(ledger.calls().contains(&"list_batches limit=1000 offset=0 order_by=timestamp_desc".to_string()));
    }

    #[tokio::test]
    async fn test_limit_above_maximum_is_clamped() {
        for requested in [1001, 5000] {
            let ledger = ledger_with_batches(3);
            let response = BatchLister::new(ledger.clone())
                .list(ListBatchesRequest {
                    limit: requested,
                    ..Default::default()
                })
                .await;

            assert_eq!(response.limit, 1000);
            assert_eq!(response.total_count, 3);
            assert!(ledger.calls()[0].starts_with("list_batches limit=1000 "));
        }
    }

    #[tokio::test]
    async fn test_listing_paginates_and_echoes_filter() {
        let ledger = ledger_with_batches(5);
        let filter = BatchFilterInput {
            database_name: Some("production".to_string()),
            time_start: Some("2025-07-01T00:00:00Z".to_string()),
            min_transaction_count: Some(10),
            ..Default::default()
        };

        let response = BatchLister::new(ledger.clone())
            .list(ListBatchesRequest {
                filter: Some(filter.clone()),
                limit: 2,
                offset: 1,
                order_by: "count_desc".to_string(),
            })
            .await;

        assert_eq!(response.offset, 1);
        assert_eq!(response.batches.len(), 2);
        assert_eq!(response.batches[0].batch_id, "BATCH-1");
        assert!(response.has_more);
        assert_eq!(response.filter_applied, Some(FilterApplied::Filter(filter)));

        // A lone time bound is an open-ended filter, not an error.
        let seen = ledger.filters_seen()[0].clone().unwrap();
        assert_eq!(seen.time_start, Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()));
        assert_eq!(seen.time_end, None);
        assert_eq!(seen.min_transaction_count, Some(10));
    }

    #[tokio::test]
    async fn test_listing_without_filter_sends_none() {
        let ledger = ledger_with_batches(1);
        let response = BatchLister::new(ledger.clone()).list(ListBatchesRequest::default()).await;

        assert!(response.filter_applied.is_none());
        assert_eq!(response.limit, 100);
        assert_eq!(ledger.filters_seen(), vec![None]);
    }

    #[tokio::test]
    async fn test_listing_failure_returns_empty_page() {
        let ledger = Arc::new(ScriptedLedger::new().failing("list_batches"));
        let response = BatchLister::new(ledger)
            .list(ListBatchesRequest {
                limit: 5000,
                offset: 20,
                ..Default::default()
            })
            .await;

        assert!(response.batches.is_empty());
        assert_eq!(response.total_count, 0);
        assert!(!response.has_more);
        assert_eq!(response.offset, 20);
        assert_eq!(response.limit, 1000);
        match response.filter_applied {
            Some(FilterApplied::Error { error }) => assert!(error.contains("list_batches unavailable")),
            other => panic!("expected error summary, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_listing_malformed_time_is_reported() {
        let ledger = ledger_with_batches(1);
        let response = BatchLister::new(ledger.clone())
            .list(ListBatchesRequest {
                filter: Some(BatchFilterInput {
                    time_end: Some("end of june".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await;

        assert!(response.batches.is_empty());
        assert!(matches!(response.filter_applied, Some(FilterApplied::Error { .. })));
        assert!(!ledger.called("list_batches"));
    }

    fn hit(batch_id: &str, score: Option<f64>) -> SearchHit {
        SearchHit {
            batch: batch_record(batch_id),
            match_reason: "database production".to_string(),
            relevance_score: score,
        }
    }

    #[tokio::test]
    async fn test_max_results_clamped() {
        for (requested, served) in [(200, 200), (201, 200), (10, 10)] {
            let ledger = Arc::new(ScriptedLedger::new());
            BatchSearcher::new(ledger.clone())
                .search(SearchBatchesRequest {
                    max_results: requested,
                    ..Default::default()
                })
                .await;

            assert_eq!(ledger.calls(), vec![format!("search_batches max_results={}", served)]);
        }
    }

    #[tokio::test]
    async fn test_empty_search_returns_four_suggestions_in_order() {
        let ledger = Arc::new(ScriptedLedger::new());
        let criteria = SearchCriteriaInput {
            table_name: Some("financial_transactons".to_string()),
            ..Default::default()
        };
        let response = BatchSearcher::new(ledger)
            .search(SearchBatchesRequest {
                criteria: criteria.clone(),
                max_results: 50,
            })
            .await;

        assert_eq!(response.total_matches, 0);
        let suggestions = response.suggestions.unwrap();
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions, NO_MATCH_SUGGESTIONS.map(String::from).to_vec());
        assert_eq!(response.search_criteria, CriteriaEcho::Criteria(criteria));
    }

    #[tokio::test]
    async fn test_search_with_matches_has_no_suggestions() {
        let mut ledger = ScriptedLedger::new();
        ledger.search_hits = vec![hit("BATCH-1", Some(0.9)), hit("BATCH-2", None)];
        let response = BatchSearcher::new(Arc::new(ledger))
            .search(SearchBatchesRequest {
                criteria: SearchCriteriaInput {
                    database_name: Some("production".to_string()),
                    time_start: Some("2025-07-01T00:00:00".to_string()),
                    time_end: Some("2025-07-02T00:00:00".to_string()),
                    ..Default::default()
                },
                max_results: 50,
            })
            .await;

        assert!(response.suggestions.is_none());
        assert_eq!(response.total_matches, 2);
        assert_eq!(response.matches[0].batch_id, "BATCH-1");
        assert_eq!(response.matches[0].relevance_score, Some(0.9));
        assert_eq!(response.matches[0].match_reason, "database production");
    }

    #[tokio::test]
    async fn test_search_criteria_forwarded_with_parsed_times() {
        let ledger = Arc::new(ScriptedLedger::new());
        BatchSearcher::new(ledger.clone())
            .search(SearchBatchesRequest {
                criteria: SearchCriteriaInput {
                    transaction_hash: Some("9f2c1e".to_string()),
                    time_end: Some("2025-07-01T10:00:00Z".to_string()),
                    batch_id_pattern: Some("2025-07".to_string()),
                    ..Default::default()
                },
                max_results: 5,
            })
            .await;

        let criteria = ledger.criteria_seen()[0].clone();
        assert_eq!(criteria.transaction_hash.as_deref(), Some("9f2c1e"));
        assert_eq!(criteria.time_end, Some(Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap()));
        assert_eq!(criteria.batch_id_pattern.as_deref(), Some("2025-07"));
    }

    #[tokio::test]
    async fn test_search_failure_returns_single_retry_suggestion() {
        let ledger = Arc::new(ScriptedLedger::new().failing("search_batches"));
        let response = BatchSearcher::new(ledger).search(SearchBatchesRequest::default()).await;

        assert!(response.matches.is_empty());
        assert_eq!(response.search_time_ms, 0);
        assert_eq!(response.suggestions, Some(vec![SEARCH_ERROR_SUGGESTION.to_string()]));
        assert!(matches!(response.search_criteria, CriteriaEcho::Error { .. }));
    }

    #[tokio::test]
    async fn test_search_malformed_time_is_reported() {
        let ledger = Arc::new(ScriptedLedger::new());
        let response = BatchSearcher::new(ledger.clone())
            .search(SearchBatchesRequest {
                criteria: SearchCriteriaInput {
                    time_start: Some("2025/07/01".to_string()),
                    ..Default::default()
                },
                max_results: 5,
            })
            .await;

        match response.search_criteria {
            CriteriaEcho::Error { error } => assert!(error.contains("time_start")),
            other => panic!("expected error echo, got {:?}", other),
        }
        assert!(ledger.calls().is_empty());
    }

    fn ledger_config(network: &str) -> LedgerConfig {
        LedgerConfig {
            organization_id: "lunaris".to_string(),
            network: network.to_string(),
            rpc_endpoint: None,
            timeout_secs: 30,
            cache_ttl_secs: 300,
            max_retries: 3,
            aws_region: "us-west-2".to_string(),
            snapshot_path: None,
        }
    }

    #[tokio::test]
    async fn test_get_batch_and_nft_degrade_to_none() {
        let ledger = ledger_with_batches(2);
        let inspector = LedgerInspector::new(ledger, ledger_config("testnet"));
        assert_eq!(inspector.get_batch("BATCH-1").await.unwrap().batch_id, "BATCH-1");
        assert!(inspector.get_batch("BATCH-9").await.is_none());
        assert!(inspector.get_nft("BATCH-1").await.is_none());

        let failing = Arc::new(ScriptedLedger::new().failing("get_batch").failing("get_nft_info"));
        let inspector = LedgerInspector::new(failing, ledger_config("testnet"));
        assert!(inspector.get_batch("BATCH-1").await.is_none());
        assert!(inspector.get_nft("BATCH-1").await.is_none());
    }

    #[tokio::test]
    async fn test_contract_info_from_backend() {
        let mut ledger = ScriptedLedger::new();
        ledger.contract_info = Some(ContractInfo {
            contract_id: "lunaris.testnet".to_string(),
            total_batches: 42,
            total_transactions: 1234,
            earliest_batch: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            latest_batch: Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()),
            supported_databases: vec!["production".to_string()],
        });
        let summary = LedgerInspector::new(Arc::new(ledger), ledger_config("testnet"))
            .get_contract_info()
            .await;

        assert_eq!(summary.total_batches, 42);
        assert_eq!(summary.databases, vec!["production"]);
        assert_eq!(summary.organization_id, "lunaris");
        assert!(summary.contract_version.is_none());
    }

    #[tokio::test]
    async fn test_contract_info_fallback_uses_stats() {
        let mut ledger = ScriptedLedger::new();
        ledger.network = "mainnet".to_string();
        ledger.contract_stats = Some(ContractStats {
            total_batches: 7,
            total_transactions: 70,
            operation_counts: BTreeMap::new(),
        });
        let summary = LedgerInspector::new(Arc::new(ledger), ledger_config("mainnet"))
            .get_contract_info()
            .await;

        assert_eq!(summary.contract_address, "lunaris.near");
        assert_eq!(summary.total_batches, 7);
        assert_eq!(summary.total_transactions, 70);
        assert!(summary.databases.is_empty());
    }

    #[tokio::test]
    async fn test_contract_info_error_reported_in_version() {
        let ledger = Arc::new(ScriptedLedger::new().failing("get_contract_info"));
        let summary = LedgerInspector::new(ledger, ledger_config("testnet"))
            .get_contract_info()
            .await;

        assert_eq!(summary.contract_address, "lunaris.testnet");
        assert_eq!(summary.total_batches, 0);
        assert!(summary.contract_version.unwrap().starts_with("Error: "));
    }

    #[test]
    fn test_config_report_derives_contract_id() {
        let ledger = Arc::new(ScriptedLedger::new());
        let report = LedgerInspector::new(ledger.clone(), ledger_config("mainnet")).get_config();
        assert_eq!(report.contract_id, "lunaris.near");
        assert_eq!(report.timeout, 30);
        assert_eq!(report.aws_region, "us-west-2");

        let report = LedgerInspector::new(ledger, ledger_config("testnet")).get_config();
        assert_eq!(report.contract_id, "lunaris.testnet");
    }
}
