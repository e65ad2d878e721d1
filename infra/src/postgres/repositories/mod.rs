mod discount_code;

pub use discount_code::*;

use std::marker::PhantomData;

use sqlx::PgPool;

use domain::{DomainError, DomainErrorKind};

/// PostgreSQLリポジトリ
pub struct PgRepository<T> {
    pub pool: PgPool,
    _marker: PhantomData<T>,
}

impl<T> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

/// sqlxのエラーをリポジトリエラーに変換する。
pub fn repository_error(e: sqlx::Error) -> DomainError {
    DomainError {
        kind: DomainErrorKind::Repository,
        messages: vec![e.to_string().into()],
        source: e.into(),
    }
}
