//! Property-based tests for query windows

use flowgate::engine::{ActivityModel, MemoryEngine, ProcessModel};
use flowgate::model::TaskRecord;
use flowgate::query::{QueryLimits, QueryType, TaskQuery};
use flowgate::submit::{CompleteRequest, SubmitRequest};
use flowgate::FlowService;
use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use std::sync::Arc;

fn service() -> FlowService {
    let engine = MemoryEngine::new();
    engine
        .deploy(&ProcessModel {
            key: "order".to_string(),
            name: None,
            start_form_key: None,
            activities: vec![ActivityModel {
                id: "check".to_string(),
                name: None,
                form_key: None,
                candidates: vec!["ops".to_string()],
            }],
        })
        .unwrap();
    let limits = QueryLimits {
        default_limit: 20,
        max_limit: 50,
    };
    FlowService::with_forms(Arc::new(engine), Default::default(), limits)
}

fn window(
    service: &FlowService,
    query_type: QueryType,
    start: usize,
    limit: usize,
) -> Vec<TaskRecord> {
    let mut query = TaskQuery::new(query_type);
    let user = match query_type {
        QueryType::Initiate => "u1",
        QueryType::WaitingProcess | QueryType::Processed => "ops",
    };
    query.user_id = Some(user.to_string());
    query.start = start;
    query.limit = limit;
    query.need_total = true;
    let envelope = service.query(&query);
    assert!(envelope.is_success(), "{:?}", envelope.message);
    envelope.data.unwrap()
}

/// Consecutive windows concatenate to the full listing, newest first
#[test]
fn test_windows_cover_listing_property() {
    let mut runner = TestRunner::new(Config::with_cases(24));

    runner
        .run(
            &(
                1usize..9,
                1usize..5,
                prop_oneof![
                    Just(QueryType::Initiate),
                    Just(QueryType::WaitingProcess),
                    Just(QueryType::Processed),
                ],
            ),
            |(instances, size, query_type)| {
                let service = service();
                for n in 0..instances {
                    let request = SubmitRequest {
                        user_id: Some("u1".to_string()),
                        user_name: Some("User One".to_string()),
                        title: Some(format!("order {}", n)),
                        ..Default::default()
                    };
                    prop_assert!(service.submit("order", &request).is_success());
                }
                if query_type == QueryType::Processed {
                    let done = CompleteRequest {
                        user_id: Some("ops".to_string()),
                        user_name: Some("Operations".to_string()),
                        ..Default::default()
                    };
                    for task in window(&service, QueryType::WaitingProcess, 0, instances) {
                        prop_assert!(service.complete(&task.id, &done).is_success());
                    }
                    let left = window(&service, QueryType::WaitingProcess, 0, instances);
                    prop_assert!(left.is_empty());
                }

                let full = window(&service, query_type, 0, instances);
                prop_assert_eq!(full.len(), instances);
                prop_assert!(full
                    .windows(2)
                    .all(|pair| pair[0].create_time >= pair[1].create_time));

                let mut paged = Vec::new();
                let mut start = 0;
                while start < instances {
                    let rows = window(&service, query_type, start, size);
                    prop_assert!(rows.len() <= size);
                    paged.extend(rows);
                    start += size;
                }
                let full_ids: Vec<&str> = full.iter().map(|r| r.id.as_str()).collect();
                let paged_ids: Vec<&str> = paged.iter().map(|r| r.id.as_str()).collect();
                prop_assert_eq!(full_ids, paged_ids);

                Ok(())
            },
        )
        .unwrap();
}

/// Zero takes the default, anything else is capped at the maximum
#[test]
fn test_page_limit_clamp_property() {
    let mut runner = TestRunner::default();

    runner
        .run(
            &(1usize..100, 1usize..100, 0usize..1000, 0usize..1000),
            |(default_limit, extra, start, limit)| {
                let limits = QueryLimits {
                    default_limit,
                    max_limit: default_limit + extra,
                };
                let page = limits.page(start, limit);

                prop_assert_eq!(page.offset, start);
                if limit == 0 {
                    prop_assert_eq!(page.limit, default_limit);
                } else {
                    prop_assert_eq!(page.limit, limit.min(limits.max_limit));
                    prop_assert!(page.limit >= 1);
                }

                Ok(())
            },
        )
        .unwrap();
}
