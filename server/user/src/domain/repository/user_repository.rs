use async_trait::async_trait;

use crate::domain::entity::user::{NewUser, User};

/// UserRepository はユーザー永続化のためのリポジトリトレイト。
/// 実装は PostgreSQL の users テーブルに対して CRUD を行う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 全ユーザーを取得する。
    async fn find_all(&self) -> anyhow::Result<Vec<User>>;

    /// ID でユーザーを取得する。存在しない場合は None を返す。
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;

    /// ユーザーを保存し、採番済みの表現を返す。
    async fn save(&self, user: NewUser) -> anyhow::Result<User>;
}
