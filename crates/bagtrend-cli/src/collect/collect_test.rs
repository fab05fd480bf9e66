use super::*;
use bagtrend_core::app_config::Environment;
use bagtrend_core::CredentialSource;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(store: &str, trends: &str, market: &str, name: &str) -> AppConfig {
    let dir = std::env::temp_dir().join(format!("bagtrend-collect-test-{name}"));
    std::fs::create_dir_all(&dir).unwrap();
    let creds = dir.join("credentials.json");
    std::fs::write(
        &creds,
        r#"{"document_id": "doc-1", "access_token": "test-token"}"#,
    )
    .unwrap();
    AppConfig {
        env: Environment::Test,
        log_level: "info".to_string(),
        credential_source: CredentialSource::File(creds),
        store_base_url: store.to_string(),
        keyword_cache_path: dir.join("no_such_cache.json"),
        trends_base_url: trends.to_string(),
        trends_timeframe: "today 3-m".to_string(),
        trends_batch_size: 5,
        marketplace_base_url: format!("{market}/sch/i.html"),
        delay_min_secs: 0,
        delay_max_secs: 0,
        request_timeout_secs: 5,
        user_agent: "bagtrend-test/0".to_string(),
    }
}

async fn mount_missing_keywords_table(store: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/spreadsheets/doc-1/values/keywords"))
        .respond_with(ResponseTemplate::new(400))
        .mount(store)
        .await;
}

async fn mount_error_log(store: &MockServer, min_appends: u64) {
    Mock::given(method("GET"))
        .and(path("/spreadsheets/doc-1/values/error_log"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["timestamp", "message"]]
        })))
        .mount(store)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/doc-1/values/error_log:append"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(min_appends..)
        .mount(store)
        .await;
}

#[tokio::test]
async fn failing_sources_leave_trend_tables_untouched_and_log_errors() {
    let store = MockServer::start().await;
    let trends = MockServer::start().await;
    let market = MockServer::start().await;

    mount_missing_keywords_table(&store).await;
    mount_error_log(&store, 1).await;
    // A category whose fetch fails completely must not be cleared or written.
    Mock::given(method("POST"))
        .and(path_regex(r"^/spreadsheets/doc-1/values/\w+_trends:clear$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/spreadsheets/doc-1/values/\w+_trends:append$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/doc-1/values/price_data:append"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&trends)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&market)
        .await;

    let config = test_config(&store.uri(), &trends.uri(), &market.uri(), "failing");
    // The run must complete despite every source failing.
    run_collect(&config, None, false).await.unwrap();
}

#[tokio::test]
async fn dry_run_resolves_keywords_but_fetches_nothing() {
    let store = MockServer::start().await;
    let trends = MockServer::start().await;
    let market = MockServer::start().await;

    mount_missing_keywords_table(&store).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&trends)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&market)
        .await;

    let config = test_config(&store.uri(), &trends.uri(), &market.uri(), "dry-run");
    run_collect(&config, None, true).await.unwrap();
}

#[tokio::test]
async fn successful_category_is_cleared_and_rewritten_once() {
    let store = MockServer::start().await;
    let trends = MockServer::start().await;
    let market = MockServer::start().await;

    mount_missing_keywords_table(&store).await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/doc-1/values/brand_trends:clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/doc-1/values/brand_trends:append"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store)
        .await;

    // Wide data covering the default brand keywords; each sub-batch picks
    // out the keywords it asked for.
    let values = json!({
        "Hermès bag": 40, "Chanel bag": 55, "Louis Vuitton bag": 61,
        "Gucci bag": 33, "Prada bag": 27, "Bottega Veneta bag": 48
    });
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timeline": [
                { "date": "2026-08-01", "values": values.clone(), "is_partial": false },
                { "date": "2026-08-02", "values": values, "is_partial": true }
            ]
        })))
        .expect(2)
        .mount(&trends)
        .await;
    // Filtered runs skip the price track entirely.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&market)
        .await;

    let config = test_config(&store.uri(), &trends.uri(), &market.uri(), "brands-only");
    run_collect(&config, Some(Category::Brands), false)
        .await
        .unwrap();
}

#[tokio::test]
async fn price_track_appends_without_clearing() {
    let store = MockServer::start().await;
    let trends = MockServer::start().await;
    let market = MockServer::start().await;

    mount_missing_keywords_table(&store).await;
    mount_error_log(&store, 1).await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/doc-1/values/price_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["query", "title", "price", "date_scraped"]]
        })))
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/doc-1/values/price_data:append"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/doc-1/values/price_data:clear"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;

    // Trend categories all fail; only the price track produces data.
    Mock::given(method("GET"))
        .and(path("/api/interest_over_time"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&trends)
        .await;
    let html = r#"<html><body>
        <li class="s-item">
            <div class="s-item__title">Chanel classic flap bag</div>
            <span class="s-item__price">$2,400.00</span>
        </li>
    </body></html>"#;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&market)
        .await;

    let config = test_config(&store.uri(), &trends.uri(), &market.uri(), "price-track");
    run_collect(&config, None, false).await.unwrap();
}
