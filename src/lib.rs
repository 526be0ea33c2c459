// 機能モジュール構造
pub mod cli;
pub mod features;
pub mod shared;

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// アプリケーション状態（データベース接続を保持）
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
}

impl AppState {
    /// 新しいAppStateを作成する
    ///
    /// # 引数
    /// * `conn` - 初期化済みのデータベース接続
    ///
    /// # 戻り値
    /// AppStateインスタンス
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// データベース接続への共有ハンドルを返す
    pub fn db_handle(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.db)
    }
}
