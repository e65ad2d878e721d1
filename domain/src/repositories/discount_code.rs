use crate::{
    DomainResult,
    models::{DiscountCode, DiscountCodeId, DiscountCodeTitle, LookupCriteria},
};

/// 割引コードリポジトリ
///
/// 割引コードを読み取るだけで、登録、更新及び削除はしない。
#[async_trait::async_trait]
pub trait DiscountCodeRepository: Sync + Send {
    /// 検索条件を満たす割引コードを取得する。
    ///
    /// 検索条件を満たす割引コードが複数ある場合は、作成日時が最も新しいものを返す。
    /// 作成日時が同じ場合は、IDが最も大きいものを返す。
    ///
    /// # 引数
    ///
    /// * `title` - 割引コードのタイトル
    /// * `criteria` - 検索条件
    async fn find_valid_code(
        &self,
        title: &DiscountCodeTitle,
        criteria: &LookupCriteria,
    ) -> DomainResult<Option<DiscountCode>>;

    /// タイトルが一致するすべての割引コードを、作成日時の新しい順に取得する。
    async fn by_title(&self, title: &DiscountCodeTitle) -> DomainResult<Vec<DiscountCode>>;

    /// 割引コードをIDで取得する。
    async fn by_id(&self, id: DiscountCodeId) -> DomainResult<Option<DiscountCode>>;
}
