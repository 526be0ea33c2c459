use crate::features::auth::models::{ProviderUser, User};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{self, id};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// ユーザーデータのリポジトリ
///
/// 認証プロバイダーのユーザー情報からのユーザー作成・取得、
/// 契約プランの更新を提供する
#[derive(Clone)]
pub struct UserRepository {
    /// データベース接続
    db_connection: Arc<Mutex<Connection>>,
}

impl UserRepository {
    /// 新しいUserRepositoryインスタンスを作成する
    ///
    /// # 引数
    /// * `db_connection` - データベース接続
    ///
    /// # 戻り値
    /// UserRepositoryインスタンス
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        Self { db_connection }
    }

    /// プロバイダーのユーザー情報からユーザーを作成または取得する
    ///
    /// # 引数
    /// * `provider_user` - 認証プロバイダーから取得したユーザー情報
    ///
    /// # 戻り値
    /// 作成または取得されたユーザー情報、失敗時はエラー
    ///
    /// # 処理内容
    /// 1. プロバイダーIDでユーザーを検索
    /// 2. 存在する場合はプロフィール情報を同期して返す
    /// 3. 存在しない場合は新規ユーザーを作成して返す
    pub fn find_or_create_user(&self, provider_user: ProviderUser) -> AppResult<User> {
        let conn = self
            .db_connection
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

        // 既存ユーザーを検索
        if let Some(existing_user) =
            self.get_user_by_provider_id_internal(&conn, &provider_user.id)?
        {
            // 既存ユーザーの情報を更新
            self.sync_user_info(&conn, &existing_user, &provider_user)?;
            // 更新後のユーザー情報を取得して返す
            return self
                .get_user_by_provider_id_internal(&conn, &provider_user.id)?
                .ok_or_else(|| AppError::Database("更新後のユーザー取得に失敗".to_string()));
        }

        // 新規ユーザーを作成
        self.create_new_user(&conn, &provider_user)
    }

    /// ユーザーIDでユーザーを取得する
    ///
    /// # 引数
    /// * `user_id` - ユーザーID（nanoId形式）
    ///
    /// # 戻り値
    /// ユーザー情報（存在しない場合はNone）、失敗時はエラー
    pub fn get_user_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        let conn = self
            .db_connection
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

        self.get_user_by_id_internal(&conn, user_id)
    }

    /// プロバイダーIDでユーザーを取得する
    ///
    /// # 引数
    /// * `provider_id` - プロバイダー側のユーザーID
    ///
    /// # 戻り値
    /// ユーザー情報（存在しない場合はNone）、失敗時はエラー
    pub fn get_user_by_provider_id(&self, provider_id: &str) -> AppResult<Option<User>> {
        let conn = self
            .db_connection
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

        self.get_user_by_provider_id_internal(&conn, provider_id)
    }

    /// ユーザーの契約プランを更新する
    ///
    /// # 引数
    /// * `user_id` - ユーザーID（nanoId形式）
    /// * `plan` - 新しいプラン（free / pro）
    ///
    /// # 戻り値
    /// 更新されたユーザー情報、失敗時はエラー
    pub fn update_plan(&self, user_id: &str, plan: &str) -> AppResult<User> {
        let conn = self
            .db_connection
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

        let updated_at = utils::get_current_timestamp();

        let rows_affected = conn.execute(
            "UPDATE users SET plan = ?1, updated_at = ?2 WHERE id = ?3",
            params![plan, updated_at, user_id],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(
                "更新対象のユーザーが見つかりません".to_string(),
            ));
        }

        self.get_user_by_id_internal(&conn, user_id)?
            .ok_or_else(|| AppError::Database("更新後のユーザー取得に失敗".to_string()))
    }

    /// 内部用：ユーザーIDでユーザーを取得する
    fn get_user_by_id_internal(
        &self,
        conn: &Connection,
        user_id: &str,
    ) -> AppResult<Option<User>> {
        let mut stmt = conn.prepare(
            "SELECT id, provider_id, email, name, picture_url, plan, created_at, updated_at
             FROM users
             WHERE id = ?1",
        )?;

        let mut user_iter = stmt.query_map(params![user_id], |row| self.row_to_user(row))?;

        match user_iter.next() {
            Some(user) => Ok(Some(user?)),
            None => Ok(None),
        }
    }

    /// 内部用：プロバイダーIDでユーザーを取得する
    fn get_user_by_provider_id_internal(
        &self,
        conn: &Connection,
        provider_id: &str,
    ) -> AppResult<Option<User>> {
        let mut stmt = conn.prepare(
            "SELECT id, provider_id, email, name, picture_url, plan, created_at, updated_at
             FROM users
             WHERE provider_id = ?1",
        )?;

        let mut user_iter = stmt.query_map(params![provider_id], |row| self.row_to_user(row))?;

        match user_iter.next() {
            Some(user) => Ok(Some(user?)),
            None => Ok(None),
        }
    }

    /// 新規ユーザーを作成する
    fn create_new_user(&self, conn: &Connection, provider_user: &ProviderUser) -> AppResult<User> {
        // nanoIdを生成
        let user_id = id::generate_user_id();
        let timestamp = utils::get_current_timestamp();

        // 新規ユーザーはfreeプランで開始
        conn.execute(
            "INSERT INTO users (id, provider_id, email, name, picture_url, plan, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'free', ?6, ?7)",
            params![
                user_id,
                provider_user.id,
                provider_user.email,
                provider_user.name,
                provider_user.picture,
                timestamp,
                timestamp
            ],
        )?;

        log::info!("新規ユーザーを作成しました: user_id={user_id}");

        // 作成されたユーザー情報を取得して返す
        self.get_user_by_id_internal(conn, &user_id)?
            .ok_or_else(|| AppError::Database("作成されたユーザーの取得に失敗".to_string()))
    }

    /// 既存ユーザーのプロフィール情報を同期する
    fn sync_user_info(
        &self,
        conn: &Connection,
        existing_user: &User,
        provider_user: &ProviderUser,
    ) -> AppResult<()> {
        // 更新が必要かチェック
        let needs_update = existing_user.email != provider_user.email
            || existing_user.name != provider_user.name
            || existing_user.picture_url != provider_user.picture;

        if !needs_update {
            return Ok(());
        }

        let updated_at = utils::get_current_timestamp();

        conn.execute(
            "UPDATE users SET email = ?1, name = ?2, picture_url = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                provider_user.email,
                provider_user.name,
                provider_user.picture,
                updated_at,
                &existing_user.id
            ],
        )?;

        Ok(())
    }

    /// データベース行からUserオブジェクトを作成する
    fn row_to_user(&self, row: &Row) -> Result<User, rusqlite::Error> {
        let created_at_str: String = row.get(6)?;
        let updated_at_str: String = row.get(7)?;

        // RFC3339形式の文字列をDateTime<Utc>に変換
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Utc);

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Utc);

        Ok(User {
            id: row.get(0)?,
            provider_id: row.get(1)?,
            email: row.get(2)?,
            name: row.get(3)?,
            picture_url: row.get(4)?,
            plan: row.get(5)?,
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::create_tables;

    /// テスト用のUserRepositoryを作成する
    fn create_test_repository() -> UserRepository {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        UserRepository::new(Arc::new(Mutex::new(conn)))
    }

    /// テスト用のProviderUserを作成する
    fn create_test_provider_user() -> ProviderUser {
        ProviderUser {
            id: "provider_123".to_string(),
            email: "test@example.com".to_string(),
            name: "テストユーザー".to_string(),
            picture: Some("https://example.com/picture.jpg".to_string()),
        }
    }

    #[test]
    fn test_find_or_create_user_new() {
        let repository = create_test_repository();
        let provider_user = create_test_provider_user();

        // 新規ユーザーを作成
        let user = repository
            .find_or_create_user(provider_user.clone())
            .unwrap();

        // ユーザー情報が正しく設定されていることを確認
        assert_eq!(user.provider_id, provider_user.id);
        assert_eq!(user.email, provider_user.email);
        assert_eq!(user.name, provider_user.name);
        assert_eq!(user.picture_url, provider_user.picture);
        // 新規ユーザーはfreeプランで開始
        assert_eq!(user.plan, "free");
        // IDがnanoId形式（21文字・URL-safe）であることを確認
        assert!(id::is_valid_nanoid(&user.id));
    }

    #[test]
    fn test_find_or_create_user_existing() {
        let repository = create_test_repository();
        let provider_user = create_test_provider_user();

        // 最初にユーザーを作成
        let user1 = repository
            .find_or_create_user(provider_user.clone())
            .unwrap();

        // 同じプロバイダーユーザーで再度呼び出し
        let user2 = repository.find_or_create_user(provider_user).unwrap();

        // 同じユーザーが返されることを確認
        assert_eq!(user1.id, user2.id);
        assert_eq!(user1.provider_id, user2.provider_id);
    }

    #[test]
    fn test_find_or_create_user_syncs_profile() {
        let repository = create_test_repository();
        let provider_user = create_test_provider_user();

        let user = repository
            .find_or_create_user(provider_user.clone())
            .unwrap();

        // プロバイダー側で表示名が変わったケース
        let mut renamed = provider_user;
        renamed.name = "改名後のユーザー".to_string();

        let updated = repository.find_or_create_user(renamed).unwrap();

        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "改名後のユーザー");
    }

    #[test]
    fn test_find_or_create_user_keeps_plan_on_sync() {
        let repository = create_test_repository();
        let provider_user = create_test_provider_user();

        let user = repository
            .find_or_create_user(provider_user.clone())
            .unwrap();
        repository.update_plan(&user.id, "pro").unwrap();

        // プロフィール同期を挟んでもプランは維持される
        let mut renamed = provider_user;
        renamed.name = "改名後のユーザー".to_string();
        let synced = repository.find_or_create_user(renamed).unwrap();

        assert_eq!(synced.plan, "pro");
    }

    #[test]
    fn test_get_user_by_id() {
        let repository = create_test_repository();
        let provider_user = create_test_provider_user();

        let created_user = repository.find_or_create_user(provider_user).unwrap();

        let retrieved_user = repository
            .get_user_by_id(&created_user.id)
            .unwrap()
            .unwrap();

        assert_eq!(created_user.id, retrieved_user.id);
        assert_eq!(created_user.provider_id, retrieved_user.provider_id);
        assert_eq!(created_user.email, retrieved_user.email);
    }

    #[test]
    fn test_get_user_by_id_not_found() {
        let repository = create_test_repository();

        let result = repository.get_user_by_id("nonexistent_id").unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_get_user_by_provider_id() {
        let repository = create_test_repository();
        let provider_user = create_test_provider_user();

        let created_user = repository
            .find_or_create_user(provider_user.clone())
            .unwrap();

        let retrieved_user = repository
            .get_user_by_provider_id(&provider_user.id)
            .unwrap()
            .unwrap();

        assert_eq!(created_user.id, retrieved_user.id);
    }

    #[test]
    fn test_update_plan() {
        let repository = create_test_repository();
        let provider_user = create_test_provider_user();

        let user = repository.find_or_create_user(provider_user).unwrap();
        assert_eq!(user.plan, "free");

        let upgraded = repository.update_plan(&user.id, "pro").unwrap();
        assert_eq!(upgraded.plan, "pro");
        assert!(upgraded.is_pro());
    }

    #[test]
    fn test_update_plan_not_found() {
        let repository = create_test_repository();

        let result = repository.update_plan("nonexistent_id", "pro");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
