use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    helpers::{load_app_settings_for_testing, split_response},
    test_case::{
        AUGUST_31_END, DRAFT5_ID, EnableTracing, InsertTestData, JULY_15, JUNE_1, PAGE_ID,
        REGIONAL10_ID, SEPTEMBER_1, SPRING15_ID, SUMMER25_NEW_ID, SUMMER25_OLD_ID, TestCase,
    },
};

#[derive(Debug, Deserialize)]
struct LookupBody {
    outcome: String,
    id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct ValueBody {
    outcome: String,
    value: Option<Value>,
}

async fn begin() -> TestCase {
    begin_with(EnableTracing::No).await
}

async fn begin_with(tracing: EnableTracing) -> TestCase {
    let app_settings = load_app_settings_for_testing();
    TestCase::begin(app_settings, tracing, InsertTestData::Yes).await
}

async fn lookup(test_case: &TestCase, query: &[(&str, &str)]) -> LookupBody {
    let response = split_response(test_case.lookup(query).await).await;
    assert_eq!(response.status_code, StatusCode::OK, "{}", response.body);
    serde_json::from_str(&response.body).unwrap()
}

async fn value(test_case: &TestCase, key: &str, field: &str) -> ValueBody {
    let response = split_response(test_case.value(key, field).await).await;
    assert_eq!(response.status_code, StatusCode::OK, "{}", response.body);
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test]
#[ignore]
async fn lookup_returns_newest_valid_code() {
    let test_case = begin().await;

    let timestamp = JULY_15.to_string();
    let body = lookup(&test_case, &[("title", "SUMMER25"), ("timestamp", &timestamp)]).await;
    assert_eq!(body.outcome, "found");
    assert_eq!(body.id, Some(SUMMER25_NEW_ID));
    assert_ne!(body.id, Some(SUMMER25_OLD_ID));

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn lookup_includes_both_ends_of_validity_period() {
    let test_case = begin().await;

    for timestamp in [JUNE_1, AUGUST_31_END] {
        let timestamp = timestamp.to_string();
        let body = lookup(&test_case, &[("title", "SUMMER25"), ("timestamp", &timestamp)]).await;
        assert_eq!(body.outcome, "found", "timestamp: {timestamp}");
        assert_eq!(body.id, Some(SUMMER25_NEW_ID));
    }

    let timestamp = SEPTEMBER_1.to_string();
    let body = lookup(&test_case, &[("title", "SUMMER25"), ("timestamp", &timestamp)]).await;
    assert_eq!(body.outcome, "expired");
    assert_eq!(body.id, None);

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn lookup_reports_why_code_was_rejected() {
    let test_case = begin_with(EnableTracing::Yes).await;
    let timestamp = JULY_15.to_string();

    let body = lookup(&test_case, &[("title", "DRAFT5"), ("timestamp", &timestamp)]).await;
    assert_eq!(body.outcome, "unpublished");
    assert_eq!(body.id, None);

    let body = lookup(&test_case, &[("title", "SPRING15"), ("timestamp", &timestamp)]).await;
    assert_eq!(body.outcome, "expired");
    assert_eq!(body.id, None);

    let body = lookup(&test_case, &[("title", "WINTER40"), ("timestamp", &timestamp)]).await;
    assert_eq!(body.outcome, "not_found");
    assert_eq!(body.id, None);

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn lookup_filters_by_region() {
    let test_case = begin().await;
    let timestamp = JULY_15.to_string();

    let body = lookup(
        &test_case,
        &[("title", "REGIONAL10"), ("timestamp", &timestamp), ("region", "3")],
    )
    .await;
    assert_eq!(body.outcome, "found");
    assert_eq!(body.id, Some(REGIONAL10_ID));

    let body = lookup(&test_case, &[("title", "REGIONAL10"), ("timestamp", &timestamp)]).await;
    assert_eq!(body.outcome, "found");
    assert_eq!(body.id, Some(REGIONAL10_ID));

    let body = lookup(
        &test_case,
        &[("title", "REGIONAL10"), ("timestamp", &timestamp), ("region", "4")],
    )
    .await;
    assert_eq!(body.outcome, "wrong_region");
    assert_eq!(body.id, None);

    let body = lookup(
        &test_case,
        &[("title", "SUMMER25"), ("timestamp", &timestamp), ("region", "3")],
    )
    .await;
    assert_eq!(body.outcome, "wrong_region");

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn lookup_with_empty_title_is_not_found() {
    let test_case = begin().await;

    let body = lookup(&test_case, &[("title", "")]).await;
    assert_eq!(body.outcome, "not_found");
    assert_eq!(body.id, None);

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn lookup_with_invalid_region_is_bad_request() {
    let test_case = begin().await;

    let response = split_response(
        test_case
            .lookup(&[("title", "REGIONAL10"), ("region", "0")])
            .await,
    )
    .await;
    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert!(body["messages"].is_array());

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn value_by_id_returns_custom_field() {
    let test_case = begin().await;

    let body = value(&test_case, &SUMMER25_OLD_ID.to_string(), "field_note").await;
    assert_eq!(body.outcome, "found");
    assert_eq!(body.value, Some(json!("first issue")));

    let body = value(&test_case, &SUMMER25_OLD_ID.to_string(), "field_percent").await;
    assert_eq!(body.value, Some(json!(25)));

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn value_by_title_uses_newest_code() {
    let test_case = begin().await;

    let body = value(&test_case, "SUMMER25", "field_percent").await;
    assert_eq!(body.outcome, "found");
    assert_eq!(body.value, Some(json!(30)));

    let body = value(&test_case, "SUMMER25", "field_rate").await;
    assert_eq!(body.value, Some(json!(0.3)));

    let body = value(&test_case, "SUMMER25", "field_stackable").await;
    assert_eq!(body.value, Some(json!(false)));

    // 古い方のレコードにしかないフィールド
    let body = value(&test_case, "SUMMER25", "field_note").await;
    assert_eq!(body.outcome, "field_missing");
    assert_eq!(body.value, None);

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn value_by_title_ignores_status_and_validity() {
    let test_case = begin().await;

    let body = value(&test_case, "DRAFT5", "field_percent").await;
    assert_eq!(body.outcome, "found");
    assert_eq!(body.value, Some(json!(5)));

    let body = value(&test_case, &DRAFT5_ID.to_string(), "status").await;
    assert_eq!(body.value, Some(json!(false)));

    let body = value(&test_case, "SPRING15", "valid_until").await;
    assert_eq!(body.value, Some(json!("2025-05-31")));

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn value_returns_builtin_fields() {
    let test_case = begin().await;
    let key = REGIONAL10_ID.to_string();

    let body = value(&test_case, &key, "id").await;
    assert_eq!(body.value, Some(json!(key)));
    let body = value(&test_case, &key, "title").await;
    assert_eq!(body.value, Some(json!("REGIONAL10")));
    let body = value(&test_case, &key, "region").await;
    assert_eq!(body.value, Some(json!(3)));
    let body = value(&test_case, &key, "valid_from").await;
    assert_eq!(body.value, Some(json!("2025-01-01")));
    let body = value(&test_case, &key, "created_at").await;
    assert_eq!(body.value, Some(json!("2024-12-01T09:00:00Z")));

    // 地域が登録されていない割引コード
    let body = value(&test_case, "SUMMER25", "region").await;
    assert_eq!(body.outcome, "field_missing");

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn value_reports_missing_code_and_field() {
    let test_case = begin().await;

    let body = value(&test_case, &Uuid::new_v4().to_string(), "field_percent").await;
    assert_eq!(body.outcome, "not_found");

    let body = value(&test_case, &PAGE_ID.to_string(), "field_percent").await;
    assert_eq!(body.outcome, "not_found");

    let body = value(&test_case, "WINTER40", "field_percent").await;
    assert_eq!(body.outcome, "not_found");

    let body = value(&test_case, "SUMMER25", "field_unknown").await;
    assert_eq!(body.outcome, "field_missing");

    let body = value(&test_case, "SUMMER25", "Field-Percent").await;
    assert_eq!(body.outcome, "field_missing");

    // 配列の値は保持しない
    let body = value(&test_case, &SPRING15_ID.to_string(), "field_tiers").await;
    assert_eq!(body.outcome, "field_missing");
    assert_eq!(body.value, None);

    test_case.end().await;
}

#[tokio::test]
#[ignore]
async fn padded_titles_are_rejected_by_storage() {
    let test_case = begin().await;

    for title in [" SUMMER25", "SUMMER25\t", ""] {
        let result = sqlx::query(
            r#"
            INSERT INTO content_entries (entry_type, title, valid_from, valid_until)
            VALUES ('discount_code', $1, '2025-01-01', '2025-12-31')
            "#,
        )
        .bind(title)
        .execute(&test_case.app_state.pg_pool)
        .await;
        assert!(result.is_err(), "title: {title:?}");
    }

    let timestamp = JULY_15.to_string();
    let body = lookup(&test_case, &[("title", " SUMMER25 "), ("timestamp", &timestamp)]).await;
    assert_eq!(body.outcome, "found");
    assert_eq!(body.id, Some(SUMMER25_NEW_ID));

    test_case.end().await;
}
