pub mod discount_code;

use use_case::discount_code::DiscountCodeUseCase;

use crate::{AppState, postgres::repositories::PgDiscountCodeRepository};

/// ヘルスチェックハンドラ
#[tracing::instrument()]
pub async fn health_check() -> &'static str {
    "Ok, the server is running!"
}

type DiscountCodeUseCaseImpl = DiscountCodeUseCase<PgDiscountCodeRepository>;

fn discount_code_use_case(app_state: &AppState) -> DiscountCodeUseCaseImpl {
    let repo = PgDiscountCodeRepository::new(app_state.pg_pool.clone());
    DiscountCodeUseCase::new(repo, app_state.app_settings.lookup.utc_offset)
}
