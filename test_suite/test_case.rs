use std::{thread::JoinHandle, time::Duration};

use once_cell::sync::Lazy;
use serde_json::json;
use time::{
    Date, OffsetDateTime,
    macros::{date, datetime},
};
use tokio::sync::oneshot;
use uuid::Uuid;

use app::{get_subscriber, init_subscriber};
use domain::models::DISCOUNT_CODE_ENTRY_TYPE;
use infra::AppState;
use settings::AppSettings;

use crate::helpers::{TestApp, configure_test_app, spawn_app};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `SUMMER25`のうち先に作成された割引コード
pub const SUMMER25_OLD_ID: Uuid = Uuid::from_u128(0x0197_2a00_0000_7000_8000_0000_0000_0001);
/// `SUMMER25`のうち後に作成された割引コード
pub const SUMMER25_NEW_ID: Uuid = Uuid::from_u128(0x0197_2a00_0000_7000_8000_0000_0000_0002);
/// 地域3でのみ有効な割引コード
pub const REGIONAL10_ID: Uuid = Uuid::from_u128(0x0197_2a00_0000_7000_8000_0000_0000_0003);
/// 公開されていない割引コード
pub const DRAFT5_ID: Uuid = Uuid::from_u128(0x0197_2a00_0000_7000_8000_0000_0000_0004);
/// 2025年5月31日に期限切れになる割引コード
pub const SPRING15_ID: Uuid = Uuid::from_u128(0x0197_2a00_0000_7000_8000_0000_0000_0005);
/// 割引コードでないコンテンツエントリー
pub const PAGE_ID: Uuid = Uuid::from_u128(0x0197_2a00_0000_7000_8000_0000_0000_0006);

/// 2025-07-15T12:00:00Z
pub const JULY_15: i64 = 1_752_580_800;
/// 2025-06-01T00:00:00Z
pub const JUNE_1: i64 = 1_748_736_000;
/// 2025-08-31T23:59:59Z
pub const AUGUST_31_END: i64 = 1_756_684_799;
/// 2025-09-01T00:00:00Z
pub const SEPTEMBER_1: i64 = 1_756_684_800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableTracing {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertTestData {
    Yes,
    No,
}

static TRACING: Lazy<()> = Lazy::new(|| {
    let subscriber = get_subscriber("test".into(), log::Level::Debug, std::io::stdout);
    init_subscriber(subscriber).unwrap();
});

/// Test case for integration tests
///
/// ```
/// #[tokio::test]
/// #[ignore]
/// async fn integration_test_case_skeleton() {
///     let app_settings = load_app_settings_for_testing();
///     let test_case = TestCase::begin(app_settings, EnableTracing::No, InsertTestData::Yes).await;
///
///     let response = test_case.lookup(&[("title", "SUMMER25")]).await;
///     assert!(response.status().is_success());
///
///     test_case.end().await;
/// }
/// ```
pub struct TestCase {
    pub app_state: AppState,
    app_handle: JoinHandle<()>,
    shutdown_signal: oneshot::Sender<()>,
    pub http_client: reqwest::Client,
}

impl TestCase {
    pub async fn begin(
        app_settings: AppSettings,
        tracing: EnableTracing,
        test_data: InsertTestData,
    ) -> Self {
        if tracing == EnableTracing::Yes {
            Lazy::force(&TRACING);
        }
        let app = configure_test_app(app_settings).await;
        let TestApp {
            app_settings,
            listener,
            pg_pool,
        } = app;
        let app_state = AppState {
            app_settings,
            pg_pool,
        };
        if test_data == InsertTestData::Yes {
            insert_test_data(&app_state.pg_pool).await;
        }
        let (app_handle, shutdown_signal) = spawn_app(app_state.clone(), listener).await;
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap();
        Self {
            app_state,
            app_handle,
            shutdown_signal,
            http_client,
        }
    }

    pub async fn end(self) {
        self.shutdown_signal.send(()).unwrap();
        self.app_handle.join().unwrap();
    }

    pub fn origin(&self) -> String {
        format!(
            "{}://{}:{}",
            self.app_state.app_settings.http.protocol,
            self.app_state.app_settings.http.host,
            self.app_state.app_settings.http.port,
        )
    }

    pub async fn lookup(&self, query: &[(&str, &str)]) -> reqwest::Response {
        let uri = format!("{}/discount-codes/lookup", self.origin());
        self.http_client
            .get(&uri)
            .query(query)
            .send()
            .await
            .unwrap()
    }

    pub async fn value(&self, key: &str, field: &str) -> reqwest::Response {
        let uri = format!("{}/discount-codes/value", self.origin());
        self.http_client
            .get(&uri)
            .query(&[("key", key), ("field", field)])
            .send()
            .await
            .unwrap()
    }
}

struct Fixture {
    id: Uuid,
    entry_type: &'static str,
    title: &'static str,
    published: bool,
    valid_from: Date,
    valid_until: Date,
    region_id: Option<i32>,
    fields: serde_json::Value,
    created_at: OffsetDateTime,
}

fn fixtures() -> Vec<Fixture> {
    vec![
        Fixture {
            id: SUMMER25_OLD_ID,
            entry_type: DISCOUNT_CODE_ENTRY_TYPE,
            title: "SUMMER25",
            published: true,
            valid_from: date!(2025 - 06 - 01),
            valid_until: date!(2025 - 08 - 31),
            region_id: None,
            fields: json!({"field_percent": 25, "field_note": "first issue"}),
            created_at: datetime!(2025-05-01 09:00 UTC),
        },
        Fixture {
            id: SUMMER25_NEW_ID,
            entry_type: DISCOUNT_CODE_ENTRY_TYPE,
            title: "SUMMER25",
            published: true,
            valid_from: date!(2025 - 06 - 01),
            valid_until: date!(2025 - 08 - 31),
            region_id: None,
            fields: json!({"field_percent": 30, "field_rate": 0.3, "field_stackable": false}),
            created_at: datetime!(2025-05-02 09:00 UTC),
        },
        Fixture {
            id: REGIONAL10_ID,
            entry_type: DISCOUNT_CODE_ENTRY_TYPE,
            title: "REGIONAL10",
            published: true,
            valid_from: date!(2025 - 01 - 01),
            valid_until: date!(2025 - 12 - 31),
            region_id: Some(3),
            fields: json!({"field_percent": 10}),
            created_at: datetime!(2024-12-01 09:00 UTC),
        },
        Fixture {
            id: DRAFT5_ID,
            entry_type: DISCOUNT_CODE_ENTRY_TYPE,
            title: "DRAFT5",
            published: false,
            valid_from: date!(2025 - 01 - 01),
            valid_until: date!(2025 - 12 - 31),
            region_id: None,
            fields: json!({"field_percent": 5}),
            created_at: datetime!(2024-12-01 09:00 UTC),
        },
        Fixture {
            id: SPRING15_ID,
            entry_type: DISCOUNT_CODE_ENTRY_TYPE,
            title: "SPRING15",
            published: true,
            valid_from: date!(2025 - 03 - 01),
            valid_until: date!(2025 - 05 - 31),
            region_id: None,
            fields: json!({"field_percent": 15, "field_tiers": [1, 2, 3]}),
            created_at: datetime!(2025-02-01 09:00 UTC),
        },
        Fixture {
            id: PAGE_ID,
            entry_type: "page",
            title: "WINTER40",
            published: true,
            valid_from: date!(2025 - 01 - 01),
            valid_until: date!(2025 - 12 - 31),
            region_id: None,
            fields: json!({"field_percent": 40}),
            created_at: datetime!(2024-12-01 09:00 UTC),
        },
    ]
}

async fn insert_test_data(pool: &sqlx::PgPool) {
    let mut tx = pool.begin().await.unwrap();
    for fixture in fixtures() {
        sqlx::query(
            r#"
            INSERT INTO content_entries (
                id, entry_type, title, published, valid_from, valid_until,
                region_id, fields, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            "#,
        )
        .bind(fixture.id)
        .bind(fixture.entry_type)
        .bind(fixture.title)
        .bind(fixture.published)
        .bind(fixture.valid_from)
        .bind(fixture.valid_until)
        .bind(fixture.region_id)
        .bind(sqlx::types::Json(fixture.fields))
        .bind(fixture.created_at)
        .execute(&mut *tx)
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();
}
