use async_trait::async_trait;

use crate::domain::entity::product::{NewProduct, Product};

/// ProductRepository は商品永続化のためのリポジトリトレイト。
/// 実装は PostgreSQL の products テーブルに対して CRUD を行う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 全商品を取得する。
    async fn find_all(&self) -> anyhow::Result<Vec<Product>>;

    /// ID で商品を取得する。存在しない場合は None を返す。
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Product>>;

    /// 商品を保存し、採番済みの表現を返す。
    async fn save(&self, product: NewProduct) -> anyhow::Result<Product>;
}
