use enum_display::EnumDisplay;
use serde::{Deserialize, Serialize};

/// 割引コードが条件を満たさなかった理由
///
/// 検証は公開状態、有効期間、地域の順に行われる。
/// 順序は、検証をどこまで通過したかを表し、後の検証で除外されたものほど大きい。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    /// 公開されていない
    Unpublished,
    /// 有効期間外
    Expired,
    /// 地域が一致しない
    WrongRegion,
}

/// 検索結果
///
/// 見つからなかった場合も、その理由を保持する。
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome<T> {
    /// 見つかった
    Found(T),
    /// 該当するレコードがない
    NotFound,
    /// レコードは存在するが公開されていない
    Unpublished,
    /// レコードは存在するが有効期間外
    Expired,
    /// レコードは存在するが地域が一致しない
    WrongRegion,
    /// レコードは存在するがフィールドがない
    FieldMissing,
}

/// 検索結果の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDisplay)]
#[serde(rename_all = "snake_case")]
#[enum_display(case = "Snake")]
pub enum OutcomeKind {
    Found,
    NotFound,
    Unpublished,
    Expired,
    WrongRegion,
    FieldMissing,
}

impl<T> LookupOutcome<T> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Found(_) => OutcomeKind::Found,
            Self::NotFound => OutcomeKind::NotFound,
            Self::Unpublished => OutcomeKind::Unpublished,
            Self::Expired => OutcomeKind::Expired,
            Self::WrongRegion => OutcomeKind::WrongRegion,
            Self::FieldMissing => OutcomeKind::FieldMissing,
        }
    }

    /// 見つかった値を返し、見つからなかった理由は捨てる。
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> LookupOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Found(value) => LookupOutcome::Found(f(value)),
            Self::NotFound => LookupOutcome::NotFound,
            Self::Unpublished => LookupOutcome::Unpublished,
            Self::Expired => LookupOutcome::Expired,
            Self::WrongRegion => LookupOutcome::WrongRegion,
            Self::FieldMissing => LookupOutcome::FieldMissing,
        }
    }

    /// 見つかった値から、さらに検索結果を得る。
    pub fn and_then<U, F>(self, f: F) -> LookupOutcome<U>
    where
        F: FnOnce(T) -> LookupOutcome<U>,
    {
        match self {
            Self::Found(value) => f(value),
            Self::NotFound => LookupOutcome::NotFound,
            Self::Unpublished => LookupOutcome::Unpublished,
            Self::Expired => LookupOutcome::Expired,
            Self::WrongRegion => LookupOutcome::WrongRegion,
            Self::FieldMissing => LookupOutcome::FieldMissing,
        }
    }
}

impl<T> From<Rejection> for LookupOutcome<T> {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unpublished => Self::Unpublished,
            Rejection::Expired => Self::Expired,
            Rejection::WrongRegion => Self::WrongRegion,
        }
    }
}
