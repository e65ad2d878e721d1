use time::{Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use domain::{
    DomainErrorKind, DomainResult, domain_error,
    models::{
        DiscountCode, DiscountCodeId, DiscountCodeTitle, FieldName, FieldValue, LookupCriteria,
        LookupOutcome, RegionId, select_valid,
    },
    repositories::DiscountCodeRepository,
};
use utils::time::date_of_timestamp;

/// 割引コードの検索キー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// ID
    Id(DiscountCodeId),
    /// タイトル
    Title(String),
}

impl LookupKey {
    /// 文字列から検索キーを作成する。
    ///
    /// UUIDとして解釈できる場合はID、それ以外はタイトルとみなす。
    /// 空白のみの文字列の場合は`None`を返す。
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match Uuid::parse_str(value) {
            Ok(uuid) => Some(Self::Id(DiscountCodeId::from(uuid))),
            Err(_) => Some(Self::Title(value.to_string())),
        }
    }
}

/// 割引コードユースケース
pub struct DiscountCodeUseCase<R>
where
    R: DiscountCodeRepository,
{
    pub repo: R,
    /// UNIXタイムスタンプを日付に変換するときのUTCオフセット
    pub utc_offset: UtcOffset,
}

impl<R> DiscountCodeUseCase<R>
where
    R: DiscountCodeRepository,
{
    pub fn new(repo: R, utc_offset: UtcOffset) -> Self {
        Self { repo, utc_offset }
    }

    /// 有効な割引コードのIDを返す。
    ///
    /// 公開されていて、基準日が有効期間に含まれ、地域が指定された場合は地域が一致する割引コードを検索する。
    /// 基準日は`timestamp`を日単位に切り捨てた日付で、`timestamp`が指定されない場合は現在日時を使用する。
    ///
    /// タイトルが空の場合は、リポジトリに問い合わせず`LookupOutcome::NotFound`を返す。
    ///
    /// # 引数
    ///
    /// * `title` - 割引コードのタイトル
    /// * `timestamp` - 基準日時（UNIXタイムスタンプ）
    /// * `region` - 地域
    pub async fn get(
        &self,
        title: &str,
        timestamp: Option<i64>,
        region: Option<RegionId>,
    ) -> DomainResult<LookupOutcome<DiscountCodeId>> {
        let Some(title) = lookup_title(title) else {
            return Ok(LookupOutcome::NotFound);
        };
        let reference_date = self.reference_date(timestamp)?;
        let criteria = LookupCriteria::valid_at(reference_date, region);

        let outcome = match self.repo.find_valid_code(&title, &criteria).await? {
            Some(code) => LookupOutcome::Found(code.id),
            None => {
                // 見つからなかった理由を特定する
                let candidates = self.repo.by_title(&title).await?;
                select_valid(candidates, &criteria).map(|code| code.id)
            }
        };
        tracing::debug!(
            title = %title,
            reference_date = %reference_date,
            region = ?region.map(|r| r.0),
            outcome = %outcome.kind(),
            "discount code lookup"
        );
        Ok(outcome)
    }

    /// 割引コードのフィールドの値を返す。
    ///
    /// `key`がUUIDとして解釈できる場合はIDで、それ以外の場合はタイトルで割引コードを検索する。
    /// タイトルで検索した場合、公開状態と有効期間は確認せず、最も新しく作成された割引コードを使用する。
    ///
    /// フィールド名がマシン名として正しくない場合や、割引コードがフィールドを持たない場合は
    /// `LookupOutcome::FieldMissing`を返す。
    ///
    /// # 引数
    ///
    /// * `key` - 割引コードのIDまたはタイトル
    /// * `field_name` - フィールド名
    pub async fn value(
        &self,
        key: &str,
        field_name: &str,
    ) -> DomainResult<LookupOutcome<FieldValue>> {
        let outcome = match LookupKey::parse(key) {
            Some(key) => self.by_key(key).await?,
            None => LookupOutcome::NotFound,
        };
        let name = FieldName::new(field_name.to_string()).ok();
        let outcome = outcome.and_then(|code| {
            name.as_ref()
                .and_then(|name| code.field(name))
                .map_or(LookupOutcome::FieldMissing, LookupOutcome::Found)
        });
        tracing::debug!(
            key = %key,
            field_name = %field_name,
            outcome = %outcome.kind(),
            "discount code field lookup"
        );
        Ok(outcome)
    }

    async fn by_key(&self, key: LookupKey) -> DomainResult<LookupOutcome<DiscountCode>> {
        match key {
            LookupKey::Id(id) => Ok(self
                .repo
                .by_id(id)
                .await?
                .map_or(LookupOutcome::NotFound, LookupOutcome::Found)),
            LookupKey::Title(title) => {
                let Some(title) = lookup_title(&title) else {
                    return Ok(LookupOutcome::NotFound);
                };
                let candidates = self.repo.by_title(&title).await?;
                Ok(select_valid(candidates, &LookupCriteria::any()))
            }
        }
    }

    fn reference_date(&self, timestamp: Option<i64>) -> DomainResult<Date> {
        match timestamp {
            Some(timestamp) => date_of_timestamp(timestamp, self.utc_offset).ok_or_else(|| {
                domain_error(
                    DomainErrorKind::Validation,
                    format!("{} is out of the range of a timestamp", timestamp),
                )
            }),
            None => Ok(OffsetDateTime::now_utc().to_offset(self.utc_offset).date()),
        }
    }
}

/// 検索に使用するタイトルを返す。
///
/// 空白のみのタイトルや、割引コードのタイトルとして登録できないタイトルは、
/// 一致する割引コードが存在しないため`None`を返す。
fn lookup_title(title: &str) -> Option<DiscountCodeTitle> {
    if title.trim().is_empty() {
        return None;
    }
    match DiscountCodeTitle::new(title.to_string()) {
        Ok(title) => Some(title),
        Err(e) => {
            tracing::debug!(error = %e, "the title can not match any discount code");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::{
        Date,
        macros::{date, datetime, offset},
    };

    use domain::models::{CustomFields, ValidityPeriod};

    use super::*;

    /// メモリ上の割引コードリポジトリ
    ///
    /// 問い合わせの回数を記録する。
    #[derive(Default)]
    struct InMemoryDiscountCodeRepository {
        codes: Vec<DiscountCode>,
        queries: AtomicUsize,
    }

    impl InMemoryDiscountCodeRepository {
        fn new(codes: Vec<DiscountCode>) -> Self {
            Self {
                codes,
                queries: AtomicUsize::new(0),
            }
        }

        fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }

        fn with_title(&self, title: &DiscountCodeTitle) -> Vec<DiscountCode> {
            self.codes
                .iter()
                .filter(|code| code.title == *title)
                .cloned()
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl DiscountCodeRepository for InMemoryDiscountCodeRepository {
        async fn find_valid_code(
            &self,
            title: &DiscountCodeTitle,
            criteria: &LookupCriteria,
        ) -> DomainResult<Option<DiscountCode>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(select_valid(self.with_title(title), criteria).found())
        }

        async fn by_title(&self, title: &DiscountCodeTitle) -> DomainResult<Vec<DiscountCode>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let mut codes = self.with_title(title);
            domain::models::sort_newest_first(&mut codes);
            Ok(codes)
        }

        async fn by_id(&self, id: DiscountCodeId) -> DomainResult<Option<DiscountCode>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.codes.iter().find(|code| code.id == id).cloned())
        }
    }

    struct CodeFixture {
        title: &'static str,
        published: bool,
        valid_from: Date,
        valid_until: Date,
        region: Option<i32>,
        created_at: OffsetDateTime,
    }

    impl Default for CodeFixture {
        fn default() -> Self {
            Self {
                title: "SUMMER25",
                published: true,
                valid_from: date!(2025 - 06 - 01),
                valid_until: date!(2025 - 08 - 31),
                region: None,
                created_at: datetime!(2025-05-01 10:00:00 UTC),
            }
        }
    }

    fn discount_code(fixture: CodeFixture) -> DiscountCode {
        let fields = [
            (
                FieldName::new("field_percent".into()).unwrap(),
                FieldValue::Integer(25),
            ),
            (
                FieldName::new("field_note".into()).unwrap(),
                FieldValue::Text(String::from("members only")),
            ),
        ]
        .into_iter()
        .collect::<CustomFields>();
        DiscountCode::new(
            DiscountCodeId::default(),
            DiscountCodeTitle::new(fixture.title.to_string()).unwrap(),
            fixture.published,
            ValidityPeriod::new(fixture.valid_from, fixture.valid_until).unwrap(),
            fixture.region.map(|r| RegionId::new(r).unwrap()),
            fields,
            fixture.created_at,
            fixture.created_at,
        )
        .unwrap()
    }

    fn use_case(codes: Vec<DiscountCode>) -> DiscountCodeUseCase<InMemoryDiscountCodeRepository> {
        DiscountCodeUseCase::new(InMemoryDiscountCodeRepository::new(codes), offset!(UTC))
    }

    // 2025-07-15 12:00:00 UTC
    const JULY_15: i64 = 1_752_580_800;
    // 2025-06-01 00:00:00 UTC
    const JUNE_1: i64 = 1_748_736_000;
    // 2025-08-31 23:59:59 UTC
    const AUGUST_31_END: i64 = 1_756_684_799;
    // 2025-09-01 00:00:00 UTC
    const SEPTEMBER_1: i64 = 1_756_684_800;

    #[rstest::rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    #[tokio::test]
    async fn get_with_empty_title_does_not_query(#[case] title: &str) {
        let use_case = use_case(vec![discount_code(CodeFixture::default())]);
        let outcome = use_case.get(title, Some(JULY_15), None).await.unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
        assert_eq!(use_case.repo.queries(), 0);
    }

    #[tokio::test]
    async fn get_with_too_long_title_does_not_query() {
        let use_case = use_case(vec![]);
        let title = "X".repeat(256);
        let outcome = use_case.get(&title, Some(JULY_15), None).await.unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
        assert_eq!(use_case.repo.queries(), 0);
    }

    #[tokio::test]
    async fn get_returns_valid_code_id() {
        let code = discount_code(CodeFixture::default());
        let use_case = use_case(vec![code.clone()]);
        let outcome = use_case.get("SUMMER25", Some(JULY_15), None).await.unwrap();
        assert_eq!(outcome, LookupOutcome::Found(code.id));
        assert_eq!(use_case.repo.queries(), 1);
    }

    #[tokio::test]
    async fn get_trims_title() {
        let code = discount_code(CodeFixture::default());
        let use_case = use_case(vec![code.clone()]);
        let outcome = use_case.get(" SUMMER25 ", Some(JULY_15), None).await.unwrap();
        assert_eq!(outcome, LookupOutcome::Found(code.id));
    }

    #[tokio::test]
    async fn get_returns_not_found_for_unknown_title() {
        let use_case = use_case(vec![discount_code(CodeFixture::default())]);
        let outcome = use_case.get("WINTER25", Some(JULY_15), None).await.unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn get_never_returns_unpublished_code() {
        let use_case = use_case(vec![discount_code(CodeFixture {
            published: false,
            ..Default::default()
        })]);
        let outcome = use_case.get("SUMMER25", Some(JULY_15), None).await.unwrap();
        assert_eq!(outcome, LookupOutcome::Unpublished);
    }

    #[rstest::rstest]
    #[case(JUNE_1, true)]
    #[case(JULY_15, true)]
    #[case(AUGUST_31_END, true)]
    #[case(SEPTEMBER_1, false)]
    #[case(JUNE_1 - 1, false)]
    #[tokio::test]
    async fn get_includes_validity_boundaries(#[case] timestamp: i64, #[case] found: bool) {
        let code = discount_code(CodeFixture::default());
        let use_case = use_case(vec![code.clone()]);
        let outcome = use_case.get("SUMMER25", Some(timestamp), None).await.unwrap();
        if found {
            assert_eq!(outcome, LookupOutcome::Found(code.id));
        } else {
            assert_eq!(outcome, LookupOutcome::Expired);
        }
    }

    #[tokio::test]
    async fn get_uses_configured_offset_for_reference_date() {
        let code = discount_code(CodeFixture::default());
        // 2025-08-31 23:30:00 UTC is already September in +01:00
        let timestamp = AUGUST_31_END - 29 * 60 - 59;
        let utc = DiscountCodeUseCase::new(
            InMemoryDiscountCodeRepository::new(vec![code.clone()]),
            offset!(UTC),
        );
        let cet = DiscountCodeUseCase::new(
            InMemoryDiscountCodeRepository::new(vec![code.clone()]),
            offset!(+1),
        );
        let outcome = utc.get("SUMMER25", Some(timestamp), None).await.unwrap();
        assert!(matches!(outcome, LookupOutcome::Found(_)));
        assert_eq!(
            cet.get("SUMMER25", Some(timestamp), None).await.unwrap(),
            LookupOutcome::Expired
        );
    }

    #[rstest::rstest]
    #[case(Some(3), Some(3), true)]
    #[case(Some(3), Some(4), false)]
    #[case(None, Some(4), false)]
    #[case(Some(3), None, true)]
    #[tokio::test]
    async fn get_filters_by_region(
        #[case] code_region: Option<i32>,
        #[case] wanted_region: Option<i32>,
        #[case] found: bool,
    ) {
        let code = discount_code(CodeFixture {
            region: code_region,
            ..Default::default()
        });
        let use_case = use_case(vec![code.clone()]);
        let region = wanted_region.map(|r| RegionId::new(r).unwrap());
        let outcome = use_case.get("SUMMER25", Some(JULY_15), region).await.unwrap();
        if found {
            assert_eq!(outcome, LookupOutcome::Found(code.id));
        } else {
            assert_eq!(outcome, LookupOutcome::WrongRegion);
        }
    }

    #[tokio::test]
    async fn get_prefers_most_recently_created_code() {
        let older = discount_code(CodeFixture {
            created_at: datetime!(2025-05-01 10:00:00 UTC),
            ..Default::default()
        });
        let newer = discount_code(CodeFixture {
            created_at: datetime!(2025-05-02 10:00:00 UTC),
            ..Default::default()
        });
        for codes in [
            vec![older.clone(), newer.clone()],
            vec![newer.clone(), older.clone()],
        ] {
            let use_case = use_case(codes);
            let outcome = use_case.get("SUMMER25", Some(JULY_15), None).await.unwrap();
            assert_eq!(outcome, LookupOutcome::Found(newer.id));
        }
    }

    #[tokio::test]
    async fn get_rejects_timestamp_out_of_range() {
        let use_case = use_case(vec![]);
        let result = use_case.get("SUMMER25", Some(i64::MAX), None).await;
        let error = result.unwrap_err();
        assert_eq!(error.kind, DomainErrorKind::Validation);
    }

    #[tokio::test]
    async fn get_without_timestamp_uses_today() {
        let today = OffsetDateTime::now_utc().date();
        let code = discount_code(CodeFixture {
            valid_from: today.previous_day().unwrap(),
            valid_until: today.next_day().unwrap(),
            ..Default::default()
        });
        let use_case = use_case(vec![code.clone()]);
        let outcome = use_case.get("SUMMER25", None, None).await.unwrap();
        assert_eq!(outcome, LookupOutcome::Found(code.id));
    }

    #[rstest::rstest]
    #[case("")]
    #[case("  ")]
    #[tokio::test]
    async fn value_with_empty_key_does_not_query(#[case] key: &str) {
        let use_case = use_case(vec![discount_code(CodeFixture::default())]);
        let outcome = use_case.value(key, "field_percent").await.unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
        assert_eq!(use_case.repo.queries(), 0);
    }

    #[tokio::test]
    async fn value_by_id() {
        let code = discount_code(CodeFixture::default());
        let use_case = use_case(vec![code.clone()]);
        let outcome = use_case
            .value(&code.id.to_string(), "field_percent")
            .await
            .unwrap();
        assert_eq!(outcome, LookupOutcome::Found(FieldValue::Integer(25)));
    }

    #[tokio::test]
    async fn value_by_unknown_id() {
        let use_case = use_case(vec![discount_code(CodeFixture::default())]);
        let key = Uuid::new_v4().to_string();
        let outcome = use_case.value(&key, "field_percent").await.unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn value_by_title_ignores_status_and_validity() {
        let code = discount_code(CodeFixture {
            published: false,
            valid_from: date!(2020 - 01 - 01),
            valid_until: date!(2020 - 01 - 31),
            ..Default::default()
        });
        let use_case = use_case(vec![code]);
        let outcome = use_case.value("SUMMER25", "field_note").await.unwrap();
        assert_eq!(
            outcome,
            LookupOutcome::Found(FieldValue::Text(String::from("members only")))
        );
    }

    #[tokio::test]
    async fn value_by_title_uses_newest_code() {
        let older = discount_code(CodeFixture {
            created_at: datetime!(2025-05-01 10:00:00 UTC),
            ..Default::default()
        });
        let newer = discount_code(CodeFixture {
            created_at: datetime!(2025-05-02 10:00:00 UTC),
            ..Default::default()
        });
        let use_case = use_case(vec![older, newer.clone()]);
        let outcome = use_case.value("SUMMER25", "id").await.unwrap();
        assert_eq!(
            outcome,
            LookupOutcome::Found(FieldValue::Text(newer.id.to_string()))
        );
    }

    #[rstest::rstest]
    #[case("field_missing")]
    #[case("Field Percent")]
    #[case("field-percent")]
    #[case("")]
    #[tokio::test]
    async fn value_of_missing_or_malformed_field(#[case] field_name: &str) {
        let use_case = use_case(vec![discount_code(CodeFixture::default())]);
        let outcome = use_case.value("SUMMER25", field_name).await.unwrap();
        assert_eq!(outcome, LookupOutcome::FieldMissing);
    }

    #[tokio::test]
    async fn value_of_unknown_title() {
        let use_case = use_case(vec![discount_code(CodeFixture::default())]);
        let outcome = use_case.value("WINTER25", "field_percent").await.unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[rstest::rstest]
    #[case("", None)]
    #[case("  ", None)]
    #[case("SUMMER25", Some(LookupKey::Title(String::from("SUMMER25"))))]
    #[case(" SUMMER25 ", Some(LookupKey::Title(String::from("SUMMER25"))))]
    #[case(
        "67e55044-10b1-426f-9247-bb680e5fe0c8",
        Some(LookupKey::Id(DiscountCodeId::from(Uuid::from_u128(0x67e55044_10b1_426f_9247_bb680e5fe0c8))))
    )]
    fn lookup_key_parse(#[case] value: &str, #[case] expected: Option<LookupKey>) {
        assert_eq!(LookupKey::parse(value), expected);
    }
}
