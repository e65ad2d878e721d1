use std::borrow::Cow;

use enum_display::EnumDisplay;

pub mod models;
pub mod repositories;

/// ドメインエラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumDisplay)]
pub enum DomainErrorKind {
    /// 検証エラー
    Validation,
    /// リポジトリエラー
    Repository,
    /// 予期しないエラー
    Unexpected,
}

/// ドメインエラー
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {}", .messages.join(", "))]
pub struct DomainError {
    /// エラーの種類
    pub kind: DomainErrorKind,
    /// エラーメッセージ
    pub messages: Vec<Cow<'static, str>>,
    /// エラーの原因
    #[source]
    pub source: anyhow::Error,
}

/// ドメイン結果
pub type DomainResult<T> = Result<T, DomainError>;

/// ドメインエラーを作成する。
///
/// # 引数
///
/// * `kind` - エラーの種類
/// * `message` - エラーメッセージ
pub fn domain_error<M>(kind: DomainErrorKind, message: M) -> DomainError
where
    M: Into<Cow<'static, str>>,
{
    let message = message.into();
    DomainError {
        kind,
        messages: vec![message.clone()],
        source: anyhow::anyhow!(message),
    }
}

fn starts_or_ends_with_whitespace(s: &str) -> bool {
    s.chars().next().is_some_and(|ch| ch.is_whitespace())
        || s.chars().last().is_some_and(|ch| ch.is_whitespace())
}
