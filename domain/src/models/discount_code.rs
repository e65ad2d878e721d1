use garde::Validate as _;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};

use utils::time::format_date;

use crate::models::primitives::Id;
use crate::models::{
    BuiltinField, CustomFields, FieldName, FieldValue, LookupOutcome, Rejection,
};
use crate::{DomainErrorKind, DomainResult, domain_error, impl_int_primitive, impl_string_primitive};

/// コンテンツエントリーの種類のうち、割引コードを表す値
pub const DISCOUNT_CODE_ENTRY_TYPE: &str = "discount_code";

/// 割引コードID
pub type DiscountCodeId = Id<DiscountCode>;

/// 割引コードのタイトル
///
/// タイトルは検索キーとして使用するが、一意であることは保証されない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, garde::Validate)]
pub struct DiscountCodeTitle(#[garde(length(chars, min = 1, max = 255))] pub String);
impl_string_primitive!(DiscountCodeTitle);

/// 地域ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, garde::Validate)]
#[serde(transparent)]
pub struct RegionId(#[garde(range(min = 1))] pub i32);
impl_int_primitive!(RegionId, i32);

/// 有効期間
///
/// 開始日と終了日を含む日単位の期間を表現する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidityPeriod {
    valid_from: Date,
    valid_until: Date,
}

impl ValidityPeriod {
    pub fn new(valid_from: Date, valid_until: Date) -> DomainResult<Self> {
        if valid_until < valid_from {
            return Err(domain_error(
                DomainErrorKind::Validation,
                "valid_from must be less than or equal to valid_until",
            ));
        }
        Ok(Self {
            valid_from,
            valid_until,
        })
    }

    pub fn valid_from(&self) -> Date {
        self.valid_from
    }

    pub fn valid_until(&self) -> Date {
        self.valid_until
    }

    /// 日付が有効期間に含まれるか確認する。開始日と終了日は有効期間に含まれる。
    pub fn contains(&self, date: Date) -> bool {
        self.valid_from <= date && date <= self.valid_until
    }
}

/// 割引コードの検索条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupCriteria {
    /// 有効期間に含まれなければならない基準日
    pub reference_date: Option<Date>,
    /// 一致しなければならない地域
    pub region: Option<RegionId>,
    /// 公開されていなければならないか
    pub require_published: bool,
}

impl LookupCriteria {
    /// 基準日に有効で公開されている割引コードを検索する条件を返す。
    pub fn valid_at(reference_date: Date, region: Option<RegionId>) -> Self {
        Self {
            reference_date: Some(reference_date),
            region,
            require_published: true,
        }
    }

    /// タイトルのみで検索する条件を返す。
    pub fn any() -> Self {
        Self {
            reference_date: None,
            region: None,
            require_published: false,
        }
    }
}

/// 割引コード
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCode {
    /// ID
    pub id: DiscountCodeId,
    /// タイトル
    pub title: DiscountCodeTitle,
    /// 公開されているか
    pub published: bool,
    /// 有効期間
    pub validity: ValidityPeriod,
    /// 地域
    pub region: Option<RegionId>,
    /// カスタムフィールド
    pub fields: CustomFields,
    /// 作成日時
    pub created_at: OffsetDateTime,
    /// 更新日時
    pub updated_at: OffsetDateTime,
}

impl DiscountCode {
    /// 割引コードを作成する。
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: DiscountCodeId,
        title: DiscountCodeTitle,
        published: bool,
        validity: ValidityPeriod,
        region: Option<RegionId>,
        fields: CustomFields,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> DomainResult<Self> {
        if created_at > updated_at {
            return Err(domain_error(
                DomainErrorKind::Validation,
                "created_at must be less than or equal to updated_at",
            ));
        }
        Ok(Self {
            id,
            title,
            published,
            validity,
            region,
            fields,
            created_at,
            updated_at,
        })
    }

    /// 割引コードが検索条件を満たすか確認する。
    ///
    /// 公開状態、有効期間、地域の順に確認して、最初に満たさなかった条件を返す。
    /// 検索条件で地域が指定されている場合、地域が登録されていない割引コードは条件を満たさない。
    pub fn check(&self, criteria: &LookupCriteria) -> Result<(), Rejection> {
        if criteria.require_published && !self.published {
            return Err(Rejection::Unpublished);
        }
        if let Some(date) = criteria.reference_date {
            if !self.validity.contains(date) {
                return Err(Rejection::Expired);
            }
        }
        if let Some(region) = criteria.region {
            if self.region != Some(region) {
                return Err(Rejection::WrongRegion);
            }
        }
        Ok(())
    }

    /// フィールドの値を返す。
    ///
    /// 組み込みフィールドを優先し、該当しない場合はカスタムフィールドを探す。
    pub fn field(&self, name: &FieldName) -> Option<FieldValue> {
        match BuiltinField::from_name(name) {
            Some(BuiltinField::Id) => Some(FieldValue::Text(self.id.to_string())),
            Some(BuiltinField::Title) => Some(FieldValue::Text(self.title.0.clone())),
            Some(BuiltinField::Status) => Some(FieldValue::Boolean(self.published)),
            Some(BuiltinField::Region) => self.region.map(|r| FieldValue::Integer(r.0.into())),
            Some(BuiltinField::ValidFrom) => {
                Some(FieldValue::Text(format_date(self.validity.valid_from())))
            }
            Some(BuiltinField::ValidUntil) => {
                Some(FieldValue::Text(format_date(self.validity.valid_until())))
            }
            Some(BuiltinField::CreatedAt) => format_datetime(self.created_at),
            Some(BuiltinField::UpdatedAt) => format_datetime(self.updated_at),
            None => self.fields.get(name).cloned(),
        }
    }
}

fn format_datetime(dt: OffsetDateTime) -> Option<FieldValue> {
    dt.format(&Rfc3339).ok().map(FieldValue::Text)
}

/// 割引コードを、作成日時の新しい順に並べ替える。
///
/// 作成日時が同じ場合はIDの降順に並べ、順序を一意に決める。
pub fn sort_newest_first(codes: &mut [DiscountCode]) {
    codes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// 候補の中から検索条件を満たす割引コードを選択する。
///
/// 条件を満たす割引コードが複数ある場合は、最も新しく作成されたものを選択する。
/// 条件を満たす割引コードがない場合は、検証を最も先まで通過した候補が除外された理由を返す。
/// 候補がない場合は`LookupOutcome::NotFound`を返す。
pub fn select_valid(
    mut candidates: Vec<DiscountCode>,
    criteria: &LookupCriteria,
) -> LookupOutcome<DiscountCode> {
    sort_newest_first(&mut candidates);
    let mut closest_miss: Option<Rejection> = None;
    for candidate in candidates {
        match candidate.check(criteria) {
            Ok(()) => return LookupOutcome::Found(candidate),
            Err(rejection) => {
                closest_miss = closest_miss.max(Some(rejection));
            }
        }
    }
    closest_miss.map_or(LookupOutcome::NotFound, LookupOutcome::from)
}
