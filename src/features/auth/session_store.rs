/// セッションストアモジュール
///
/// セッショントークンやその他の認証情報をローカルファイルに保存・取得します。
/// トークンは書き込み前にAES-256-GCMで暗号化されます。
use crate::features::auth::encryption::TokenEncryption;
use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// ストアファイル名
const STORE_FILENAME: &str = "session.json";

/// セッションストアに保存する認証情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAuthInfo {
    /// セッショントークン
    pub session_token: String,
    /// ユーザーID
    pub user_id: String,
    /// 最終ログイン日時（RFC3339形式）
    pub last_login: String,
}

/// ファイルに書き込む形式（トークンのみ暗号化済み）
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    /// 暗号化されたセッショントークン（Base64エンコード）
    session_token: String,
    /// ユーザーID
    user_id: String,
    /// 最終ログイン日時（RFC3339形式）
    last_login: String,
}

/// セッションストアサービス
#[derive(Clone)]
pub struct SessionStore {
    /// ストアファイルのパス
    store_path: PathBuf,
    /// トークン暗号化サービス
    encryption: TokenEncryption,
}

impl SessionStore {
    /// 新しいSessionStoreを作成する
    ///
    /// # 引数
    /// * `store_dir` - ストアファイルを配置するディレクトリ
    /// * `encryption_key` - トークン暗号化キー
    ///
    /// # 戻り値
    /// SessionStoreインスタンス
    pub fn new(store_dir: PathBuf, encryption_key: &str) -> Self {
        Self {
            store_path: store_dir.join(STORE_FILENAME),
            encryption: TokenEncryption::new(encryption_key),
        }
    }

    /// 認証情報をまとめて保存する
    ///
    /// # 引数
    /// * `auth_info` - 認証情報（トークンは平文で渡す）
    ///
    /// # 戻り値
    /// 処理結果
    ///
    /// # 処理内容
    /// トークンを暗号化したうえでファイル全体を書き換える
    pub fn save_auth_info(&self, auth_info: &StoredAuthInfo) -> AppResult<()> {
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let store_file = StoreFile {
            session_token: self.encryption.encrypt_token(&auth_info.session_token)?,
            user_id: auth_info.user_id.clone(),
            last_login: auth_info.last_login.clone(),
        };

        let json_data = serde_json::to_string_pretty(&store_file)?;
        fs::write(&self.store_path, json_data)?;

        log::info!("認証情報を保存しました: user_id={}", auth_info.user_id);
        Ok(())
    }

    /// セッショントークンを取得する
    ///
    /// # 戻り値
    /// 復号化されたセッショントークン（存在しない場合はNone）
    pub fn get_session_token(&self) -> AppResult<Option<String>> {
        match self.read_store()? {
            Some(store_file) => {
                let token = self.encryption.decrypt_token(&store_file.session_token)?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    /// ユーザーIDを取得する
    ///
    /// # 戻り値
    /// ユーザーID（存在しない場合はNone）
    pub fn get_user_id(&self) -> AppResult<Option<String>> {
        Ok(self.read_store()?.map(|store_file| store_file.user_id))
    }

    /// 最終ログイン日時を取得する
    ///
    /// # 戻り値
    /// 最終ログイン日時（存在しない場合はNone）
    pub fn get_last_login(&self) -> AppResult<Option<String>> {
        Ok(self.read_store()?.map(|store_file| store_file.last_login))
    }

    /// 認証情報をまとめて取得する
    ///
    /// # 戻り値
    /// 復号化された認証情報（存在しない場合はNone）
    pub fn get_auth_info(&self) -> AppResult<Option<StoredAuthInfo>> {
        match self.read_store()? {
            Some(store_file) => {
                let session_token = self.encryption.decrypt_token(&store_file.session_token)?;
                Ok(Some(StoredAuthInfo {
                    session_token,
                    user_id: store_file.user_id,
                    last_login: store_file.last_login,
                }))
            }
            None => Ok(None),
        }
    }

    /// すべての認証情報を削除する（ログアウト時）
    ///
    /// # 戻り値
    /// 処理結果
    pub fn clear_auth_info(&self) -> AppResult<()> {
        if self.store_path.exists() {
            fs::remove_file(&self.store_path)?;
            log::info!("認証情報を削除しました");
        }
        Ok(())
    }

    /// ストアファイルを読み込む
    ///
    /// # 注意
    /// ファイルが存在しない場合はNoneを返す。
    /// 解析できないファイルは壊れているとみなし、警告を出してNone扱いにする
    fn read_store(&self) -> AppResult<Option<StoreFile>> {
        if !self.store_path.exists() {
            return Ok(None);
        }

        let json_data = fs::read_to_string(&self.store_path)?;

        match serde_json::from_str::<StoreFile>(&json_data) {
            Ok(store_file) => Ok(Some(store_file)),
            Err(e) => {
                log::warn!(
                    "セッションファイルの解析に失敗しました（再ログインが必要です）: {e}"
                );
                Err(AppError::security("セッションファイルが壊れています"))
            }
        }
    }
}
