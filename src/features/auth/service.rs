/// APIサーバー経由の認証サービス
///
/// このモジュールは、セッショントークンの検証をAPIサーバー経由で行います。
/// アプリ側には認証プロバイダーの資格情報を保存せず、
/// トークンの発行と検証はすべてAPIサーバーに委譲します。
use crate::features::auth::models::{AuthState, ProviderUser, User};
use crate::features::auth::repository::UserRepository;
use crate::features::auth::session_store::{SessionStore, StoredAuthInfo};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// トークン検証エンドポイント
const VALIDATE_ENDPOINT: &str = "/api/v1/auth/validate";

/// APIサーバーから返される検証済みユーザー情報
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    /// プロバイダー側のユーザーID
    pub id: String,
    /// メールアドレス
    pub email: String,
    /// 表示名
    pub name: String,
    /// プロフィール画像URL
    pub picture: Option<String>,
}

/// 認証サービス
#[derive(Clone)]
pub struct AuthService {
    /// APIクライアント
    api: ApiClient,
    /// ユーザーリポジトリ
    users: UserRepository,
    /// セッションストア
    store: SessionStore,
}

impl AuthService {
    /// 新しいAuthServiceを作成する
    ///
    /// # 引数
    /// * `api` - APIクライアント
    /// * `db_connection` - データベース接続
    /// * `store` - セッションストア
    ///
    /// # 戻り値
    /// AuthServiceインスタンス
    pub fn new(api: ApiClient, db_connection: Arc<Mutex<Connection>>, store: SessionStore) -> Self {
        log::debug!("AuthServiceを初期化しました");

        Self {
            api,
            users: UserRepository::new(db_connection),
            store,
        }
    }

    /// セッショントークンでサインインする
    ///
    /// # 引数
    /// * `token` - APIサーバーが発行したセッショントークン
    ///
    /// # 戻り値
    /// 認証されたユーザー情報、失敗時はエラー
    ///
    /// # 処理内容
    /// 1. APIサーバーにトークン検証リクエストを送信
    /// 2. 検証済みユーザーをローカルデータベースに作成または同期
    /// 3. トークンを暗号化してセッションストアに保存
    pub async fn sign_in(&self, token: &str) -> AppResult<User> {
        log::debug!("APIサーバーにトークン検証リクエストを送信: {VALIDATE_ENDPOINT}");

        let user_info: UserInfo = self.api.get(VALIDATE_ENDPOINT, Some(token)).await?;

        log::info!(
            "APIサーバーからユーザー情報を取得しました: email={}",
            user_info.email
        );

        // ユーザー情報をローカルデータベースに保存
        let provider_user = ProviderUser {
            id: user_info.id,
            email: user_info.email,
            name: user_info.name,
            picture: user_info.picture,
        };

        let user = self.users.find_or_create_user(provider_user)?;

        // トークンをセッションストアに保存
        self.store.save_auth_info(&StoredAuthInfo {
            session_token: token.to_string(),
            user_id: user.id.clone(),
            last_login: utils::get_current_timestamp(),
        })?;

        log::info!("サインインが完了しました: user_id={}", user.id);

        Ok(user)
    }

    /// 現在のユーザーを取得する
    ///
    /// # 戻り値
    /// サインイン済みの場合はユーザー情報、未サインインの場合はNone
    ///
    /// # 注意
    /// セッションストアとローカルデータベースのみを参照するため、
    /// オフラインでも動作する
    pub fn current_user(&self) -> AppResult<Option<User>> {
        let Some(user_id) = self.store.get_user_id()? else {
            return Ok(None);
        };

        self.users.get_user_by_id(&user_id)
    }

    /// サインイン済みユーザーを取得する（未サインインはエラー）
    ///
    /// # 戻り値
    /// ユーザー情報、未サインインの場合は認証エラー
    pub fn require_user(&self) -> AppResult<User> {
        self.current_user()?.ok_or_else(|| {
            AppError::authentication(
                "サインインしていません。`login` コマンドでサインインしてください",
            )
        })
    }

    /// サインイン済みユーザーとセッショントークンを取得する
    ///
    /// # 戻り値
    /// ユーザー情報とトークンのペア、未サインインの場合は認証エラー
    pub fn require_session(&self) -> AppResult<(User, String)> {
        let user = self.require_user()?;
        let token = self
            .store
            .get_session_token()?
            .ok_or_else(|| AppError::authentication("セッショントークンが見つかりません"))?;

        Ok((user, token))
    }

    /// 保存されているセッショントークンを取得する
    ///
    /// # 戻り値
    /// セッショントークン（存在しない場合はNone）
    pub fn session_token(&self) -> AppResult<Option<String>> {
        self.store.get_session_token()
    }

    /// サインアウトする
    ///
    /// # 戻り値
    /// 処理結果
    pub fn sign_out(&self) -> AppResult<()> {
        self.store.clear_auth_info()?;

        log::info!("サインアウトが完了しました");
        Ok(())
    }

    /// 認証状態を取得する
    ///
    /// # 戻り値
    /// 現在の認証状態
    ///
    /// # 注意
    /// セッションストアが壊れている場合は警告を出し、未認証として扱う
    pub fn get_auth_state(&self) -> AuthState {
        let user = match self.current_user() {
            Ok(user) => user,
            Err(e) => {
                log::warn!("認証状態の取得に失敗しました: {e}");
                None
            }
        };

        let last_login = self.store.get_last_login().unwrap_or_default();

        AuthState {
            is_authenticated: user.is_some(),
            user,
            last_login,
        }
    }
}
