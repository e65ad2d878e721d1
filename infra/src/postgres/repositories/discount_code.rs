use sqlx::types::Json;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use domain::{
    DomainError, DomainErrorKind, DomainResult,
    models::{
        CustomFields, DISCOUNT_CODE_ENTRY_TYPE, DiscountCode, DiscountCodeId, DiscountCodeTitle,
        LookupCriteria, RegionId, ValidityPeriod,
    },
    repositories::DiscountCodeRepository,
};

use super::{PgRepository, repository_error};

pub type PgDiscountCodeRepository = PgRepository<DiscountCode>;

#[async_trait::async_trait]
impl DiscountCodeRepository for PgDiscountCodeRepository {
    /// 検索条件を満たす割引コードを取得する。
    async fn find_valid_code(
        &self,
        title: &DiscountCodeTitle,
        criteria: &LookupCriteria,
    ) -> DomainResult<Option<DiscountCode>> {
        sqlx::query_as::<_, DiscountCodeRow>(
            r#"
            SELECT
                id, title, published, valid_from, valid_until, region_id, fields,
                created_at, updated_at
            FROM content_entries
            WHERE
                entry_type = $1
                AND title = $2
                AND (NOT $3 OR published)
                AND ($4::date IS NULL OR (valid_from <= $4::date AND $4::date <= valid_until))
                AND ($5::integer IS NULL OR region_id = $5::integer)
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(DISCOUNT_CODE_ENTRY_TYPE)
        .bind(&title.0)
        .bind(criteria.require_published)
        .bind(criteria.reference_date)
        .bind(criteria.region.map(|r| r.0))
        .fetch_optional(&self.pool)
        .await
        .map_err(repository_error)?
        .map(DiscountCode::try_from)
        .transpose()
    }

    /// タイトルが一致するすべての割引コードを取得する。
    async fn by_title(&self, title: &DiscountCodeTitle) -> DomainResult<Vec<DiscountCode>> {
        sqlx::query_as::<_, DiscountCodeRow>(
            r#"
            SELECT
                id, title, published, valid_from, valid_until, region_id, fields,
                created_at, updated_at
            FROM content_entries
            WHERE entry_type = $1 AND title = $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(DISCOUNT_CODE_ENTRY_TYPE)
        .bind(&title.0)
        .fetch_all(&self.pool)
        .await
        .map_err(repository_error)?
        .into_iter()
        .map(DiscountCode::try_from)
        .collect::<Result<Vec<_>, _>>()
    }

    /// 割引コードをIDで取得する。
    async fn by_id(&self, id: DiscountCodeId) -> DomainResult<Option<DiscountCode>> {
        sqlx::query_as::<_, DiscountCodeRow>(
            r#"
            SELECT
                id, title, published, valid_from, valid_until, region_id, fields,
                created_at, updated_at
            FROM content_entries
            WHERE entry_type = $1 AND id = $2
            "#,
        )
        .bind(DISCOUNT_CODE_ENTRY_TYPE)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(repository_error)?
        .map(DiscountCode::try_from)
        .transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DiscountCodeRow {
    id: Uuid,
    title: String,
    published: bool,
    valid_from: Date,
    valid_until: Date,
    region_id: Option<i32>,
    fields: Json<serde_json::Value>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<DiscountCodeRow> for DiscountCode {
    type Error = DomainError;

    /// 保存されているレコードが検証に失敗した場合は、データの不整合として扱う。
    fn try_from(row: DiscountCodeRow) -> Result<Self, Self::Error> {
        let id = row.id;
        build_discount_code(row).map_err(|e| DomainError {
            kind: DomainErrorKind::Unexpected,
            messages: vec![format!("The stored discount code {} is invalid: {}", id, e).into()],
            source: e.into(),
        })
    }
}

fn build_discount_code(row: DiscountCodeRow) -> DomainResult<DiscountCode> {
    let fields = match row.fields.0 {
        serde_json::Value::Object(object) => CustomFields::from_json_object(object),
        serde_json::Value::Null => CustomFields::default(),
        _ => {
            tracing::warn!(id = %row.id, "fields of the discount code is not a JSON object");
            CustomFields::default()
        }
    };
    DiscountCode::new(
        row.id.into(),
        DiscountCodeTitle::new(row.title)?,
        row.published,
        ValidityPeriod::new(row.valid_from, row.valid_until)?,
        row.region_id.map(RegionId::new).transpose()?,
        fields,
        row.created_at,
        row.updated_at,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::{date, datetime};

    use domain::{
        DomainErrorKind,
        models::{CustomFields, FieldName, FieldValue},
    };

    use super::*;

    fn row(fields: serde_json::Value) -> DiscountCodeRow {
        DiscountCodeRow {
            id: Uuid::new_v4(),
            title: String::from("SPRING10"),
            published: true,
            valid_from: date!(2025 - 03 - 01),
            valid_until: date!(2025 - 05 - 31),
            region_id: Some(9),
            fields: Json(fields),
            created_at: datetime!(2025-02-01 08:00:00 UTC),
            updated_at: datetime!(2025-02-03 08:00:00 UTC),
        }
    }

    #[test]
    fn discount_code_from_row() {
        let row = row(json!({"field_percent": 10, "field_label": "Spring"}));
        let id = row.id;
        let code = DiscountCode::try_from(row).unwrap();
        assert_eq!(code.id.0, id);
        assert_eq!(&*code.title, "SPRING10");
        assert_eq!(code.region.map(|r| r.0), Some(9));
        assert_eq!(code.validity.valid_until(), date!(2025 - 05 - 31));
        assert_eq!(
            code.field(&FieldName::new("field_label".into()).unwrap()),
            Some(FieldValue::Text(String::from("Spring")))
        );
    }

    #[rstest::rstest]
    #[case(json!(null))]
    #[case(json!([1, 2, 3]))]
    #[case(json!("text"))]
    fn discount_code_from_row_without_field_object(#[case] fields: serde_json::Value) {
        let code = DiscountCode::try_from(row(fields)).unwrap();
        assert_eq!(code.fields, CustomFields::default());
    }

    #[test]
    fn discount_code_from_row_with_reversed_period() {
        let mut row = row(json!({}));
        row.valid_from = date!(2025 - 06 - 01);
        let error = DiscountCode::try_from(row).unwrap_err();
        assert_eq!(error.kind, DomainErrorKind::Unexpected);
    }

    #[rstest::rstest]
    #[case("")]
    #[case("   ")]
    fn discount_code_from_row_with_blank_title(#[case] title: &str) {
        let mut row = row(json!({}));
        row.title = String::from(title);
        let id = row.id;
        let error = DiscountCode::try_from(row).unwrap_err();
        assert_eq!(error.kind, DomainErrorKind::Unexpected);
        assert!(error.messages[0].contains(&id.to_string()));
    }

    #[test]
    fn discount_code_from_row_with_invalid_region() {
        let mut row = row(json!({}));
        row.region_id = Some(0);
        let error = DiscountCode::try_from(row).unwrap_err();
        assert_eq!(error.kind, DomainErrorKind::Unexpected);
    }
}
