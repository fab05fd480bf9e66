use super::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: &str) -> TrendsClient {
    TrendsClient::new(
        base_url,
        "today 3-m",
        5,
        DelayRange::zero(),
        5,
        "bagtrend-test/0",
    )
    .unwrap()
}

fn keywords(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn wide_body(dates: &[&str], keywords: &[&str]) -> serde_json::Value {
    let timeline: Vec<serde_json::Value> = dates
        .iter()
        .map(|date| {
            let values: serde_json::Map<String, serde_json::Value> = keywords
                .iter()
                .enumerate()
                .map(|(i, kw)| ((*kw).to_string(), json!(40 + i)))
                .collect();
            json!({ "date": date, "values": values, "is_partial": false })
        })
        .collect();
    json!({ "timeline": timeline })
}

#[tokio::test]
async fn six_keywords_issue_exactly_two_requests() {
    let server = MockServer::start().await;
    let dates = ["2026-08-01", "2026-08-02", "2026-08-03"];
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .and(query_param("keywords", "A,B,C,D,E"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(wide_body(&dates, &["A", "B", "C", "D", "E"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .and(query_param("keywords", "F"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wide_body(&dates, &["F"])))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let outcome = client(&server.uri())
        .fetch_category(&keywords(&["A", "B", "C", "D", "E", "F"]), &cancel)
        .await;

    // 6 keywords × 3 dates, long format, no duplicates.
    assert_eq!(outcome.records.len(), 18);
    assert!(outcome.errors.is_empty());
    for record in &outcome.records {
        assert!((0.0..=100.0).contains(&record.interest));
    }
}

#[tokio::test]
async fn request_count_matches_sub_batch_partitioning() {
    let server = MockServer::start().await;
    // 11 keywords at batch size 5 → ceil(11/5) = 3 requests.
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "timeline": [] })))
        .expect(3)
        .mount(&server)
        .await;

    let names: Vec<String> = (0..11).map(|i| format!("kw{i}")).collect();
    let cancel = CancellationToken::new();
    let outcome = client(&server.uri()).fetch_category(&names, &cancel).await;
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn failed_sub_batch_is_reported_and_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .and(query_param("keywords", "A,B,C,D,E"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .and(query_param("keywords", "F"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(wide_body(&["2026-08-01"], &["F"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let outcome = client(&server.uri())
        .fetch_category(&keywords(&["A", "B", "C", "D", "E", "F"]), &cancel)
        .await;

    // The bad sub-batch never aborts the category.
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].keyword, "F");
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("interest fetch failed"));
}

#[tokio::test]
async fn all_sub_batches_failing_yields_empty_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let outcome = client(&server.uri())
        .fetch_category(&keywords(&["A", "B", "C", "D", "E", "F"]), &cancel)
        .await;
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.errors.len(), 2);
}

#[tokio::test]
async fn cancelled_run_issues_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "timeline": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = client(&server.uri())
        .fetch_category(&keywords(&["A", "B"]), &cancel)
        .await;
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn duplicate_rows_in_the_response_are_dropped() {
    let server = MockServer::start().await;
    let point = json!({ "date": "2026-08-01", "values": { "A": 55 }, "is_partial": false });
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "timeline": [point.clone(), point] })),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let outcome = client(&server.uri())
        .fetch_category(&keywords(&["A"]), &cancel)
        .await;
    assert_eq!(outcome.records.len(), 1);
}

#[test]
fn reshape_produces_long_format_and_ignores_stray_columns() {
    let response: InterestResponse = serde_json::from_value(json!({
        "timeline": [
            { "date": "2026-08-01", "values": { "A": 10, "B": 20, "unrequested": 99 } },
            { "date": "2026-08-02", "values": { "A": 30 }, "is_partial": true }
        ]
    }))
    .unwrap();

    let records = reshape(&keywords(&["A", "B"]), response);
    assert_eq!(
        records,
        vec![
            InterestRecord {
                date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                keyword: "A".to_string(),
                interest: 10.0,
            },
            InterestRecord {
                date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                keyword: "B".to_string(),
                interest: 20.0,
            },
            InterestRecord {
                date: NaiveDate::from_ymd_opt(2026, 8, 2).unwrap(),
                keyword: "A".to_string(),
                interest: 30.0,
            },
        ]
    );
}

#[test]
fn reshape_clamps_out_of_scale_values() {
    let response: InterestResponse = serde_json::from_value(json!({
        "timeline": [{ "date": "2026-08-01", "values": { "A": 250, "B": -3 } }]
    }))
    .unwrap();
    let records = reshape(&keywords(&["A", "B"]), response);
    assert_eq!(records[0].interest, 100.0);
    assert_eq!(records[1].interest, 0.0);
}
