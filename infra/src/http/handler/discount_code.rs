use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use domain::models::{DiscountCodeId, FieldValue, LookupOutcome, OutcomeKind, RegionId};

use super::discount_code_use_case;
use crate::{
    AppState,
    http::{ApiError, ApiResult},
};

/// 割引コード検索のクエリパラメーター
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQueryParams {
    /// 割引コードのタイトル
    pub title: Option<String>,
    /// 基準日時（UNIXタイムスタンプ）
    pub timestamp: Option<i64>,
    /// 地域ID
    pub region: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponseBody {
    pub outcome: OutcomeKind,
    pub id: Option<DiscountCodeId>,
}

impl From<LookupOutcome<DiscountCodeId>> for LookupResponseBody {
    fn from(outcome: LookupOutcome<DiscountCodeId>) -> Self {
        Self {
            outcome: outcome.kind(),
            id: outcome.found(),
        }
    }
}

/// 有効な割引コードのIDを返すハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn lookup(
    State(app_state): State<AppState>,
    params: Result<Query<LookupQueryParams>, QueryRejection>,
) -> ApiResult<Json<LookupResponseBody>> {
    let Query(LookupQueryParams {
        title,
        timestamp,
        region,
    }) = params?;
    let region = region
        .map(RegionId::new)
        .transpose()
        .map_err(ApiError::from)?;
    let use_case = discount_code_use_case(&app_state);
    let outcome = use_case
        .get(title.as_deref().unwrap_or_default(), timestamp, region)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(outcome.into()))
}

/// 割引コードのフィールド値取得のクエリパラメーター
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValueQueryParams {
    /// 割引コードのIDまたはタイトル
    pub key: Option<String>,
    /// フィールド名
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueResponseBody {
    pub outcome: OutcomeKind,
    pub value: Option<FieldValue>,
}

impl From<LookupOutcome<FieldValue>> for ValueResponseBody {
    fn from(outcome: LookupOutcome<FieldValue>) -> Self {
        Self {
            outcome: outcome.kind(),
            value: outcome.found(),
        }
    }
}

/// 割引コードのフィールドの値を返すハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn value(
    State(app_state): State<AppState>,
    params: Result<Query<ValueQueryParams>, QueryRejection>,
) -> ApiResult<Json<ValueResponseBody>> {
    let Query(ValueQueryParams { key, field }) = params?;
    let use_case = discount_code_use_case(&app_state);
    let outcome = use_case
        .value(
            key.as_deref().unwrap_or_default(),
            field.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(ApiError::from)?;
    Ok(Json(outcome.into()))
}
