use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// データベース接続を初期化し、マイグレーションを実行する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. データベース接続の開設
/// 2. テーブル作成とマイグレーションの実行
pub fn initialize_database(database_path: &Path) -> AppResult<Connection> {
    // データベース接続を開く
    let conn = Connection::open(database_path)?;

    // テーブルを作成
    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {:?}", database_path);

    Ok(conn)
}

/// アプリデータディレクトリ内のデータベースファイルパスを取得する
///
/// # 戻り値
/// データベースファイルのパス、または失敗時はエラー
///
/// # 処理内容
/// OS標準のデータディレクトリ配下にアプリ専用ディレクトリを確保し、
/// 環境に応じたファイル名を連結する
pub fn get_database_path() -> AppResult<PathBuf> {
    // アプリケーションデータディレクトリを取得
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::configuration("データディレクトリの取得に失敗しました"))?;

    let app_data_dir = data_dir.join("orano-sabusuku");

    // ディレクトリが存在しない場合は作成
    if !app_data_dir.exists() {
        std::fs::create_dir_all(&app_data_dir).map_err(|e| {
            AppError::configuration(format!("アプリデータディレクトリの作成に失敗: {e}"))
        })?;
        log::info!(
            "アプリケーションデータディレクトリを作成: {:?}",
            app_data_dir
        );
    }

    // 環境に応じたデータベースファイル名を決定
    let db_filename = get_database_filename();
    let database_path = app_data_dir.join(db_filename);

    Ok(database_path)
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # 戻り値
/// データベースファイル名
///
/// # ファイル名の規則
/// - 開発環境: "dev_subscriptions.db"
/// - プロダクション環境: "subscriptions.db"
fn get_database_filename() -> &'static str {
    // 環境判定
    let is_production = is_production_environment();

    if is_production {
        "subscriptions.db"
    } else {
        "dev_subscriptions.db"
    }
}

/// プロダクション環境かどうかを判定する
///
/// # 戻り値
/// プロダクション環境の場合はtrue
///
/// # 判定ロジック
/// 1. コンパイル時埋め込み環境変数を最優先
/// 2. 実行時環境変数 ENVIRONMENT を確認
/// 3. デバッグビルドの場合は開発環境
/// 4. リリースビルドの場合はプロダクション環境
fn is_production_environment() -> bool {
    // コンパイル時埋め込み環境変数を最優先
    if let Some(embedded_env) = option_env!("EMBEDDED_ENVIRONMENT") {
        return embedded_env == "production";
    }

    // 実行時環境変数を確認
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        return env_var == "production";
    }

    // フォールバック: ビルド設定に基づく判定
    !cfg!(debug_assertions)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    // 既存のテーブル構造をチェック
    let table_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='subscriptions'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        // 新規インストール: 最新のスキーマでテーブルを作成
        create_subscriptions_table(conn)?;
        log::info!("新規データベースを作成しました");
    } else {
        // 既存インストール: 必要なカラムを安全に追加
        log::info!("既存のデータベースを確認中...");
        migrate_existing_tables(conn)?;
    }

    // ユーザーテーブルを作成
    create_users_table(conn)?;

    // インデックスを作成
    create_indexes(conn)?;

    Ok(())
}

/// サブスクリプションテーブルを作成する
///
/// # 注意
/// billing_cycleにCHECK制約は付けない。未知の周期値を持つ行も
/// 読み出せるようにし、書き込み側のバリデーションで検証する
fn create_subscriptions_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE subscriptions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            amount REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            billing_cycle TEXT NOT NULL,
            next_billing_date TEXT NOT NULL,
            category TEXT,
            is_active INTEGER DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// ユーザーテーブルを作成する
fn create_users_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            name TEXT NOT NULL,
            picture_url TEXT,
            plan TEXT NOT NULL DEFAULT 'free',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// 既存テーブルのマイグレーションを実行する
fn migrate_existing_tables(conn: &Connection) -> AppResult<()> {
    // currencyカラムが存在するかチェック（初期リリースはUSD固定だった）
    let has_currency = check_column_exists(conn, "subscriptions", "currency");

    if !has_currency {
        log::info!("currencyカラムを追加します...");
        // currencyカラムを追加（エラーを無視）
        let _ = conn.execute(
            "ALTER TABLE subscriptions ADD COLUMN currency TEXT NOT NULL DEFAULT 'USD'",
            [],
        );
    }

    // categoryカラムが存在するかチェック
    let has_category = check_column_exists(conn, "subscriptions", "category");
    if !has_category {
        log::info!("categoryカラムを追加します...");
        let _ = conn.execute("ALTER TABLE subscriptions ADD COLUMN category TEXT", []);
    }

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    // サブスクリプションテーブルのインデックス
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_active ON subscriptions(is_active)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_created ON subscriptions(created_at)",
        [],
    )?;

    Ok(())
}

/// データベースのバックアップを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `backup_path` - バックアップファイルのパス
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn backup_database(conn: &Connection, backup_path: &Path) -> AppResult<()> {
    let mut backup_conn = Connection::open(backup_path)?;

    // SQLiteのバックアップAPI使用
    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)?;
    backup.run_to_completion(5, std::time::Duration::from_millis(250), None)?;

    log::info!("データベースをバックアップしました: {:?}", backup_path);

    Ok(())
}

/// テーブルに指定されたカラムが存在するかチェックする
///
/// # 引数
/// * `conn` - データベース接続
/// * `table_name` - テーブル名
/// * `column_name` - カラム名
///
/// # 戻り値
/// カラムが存在する場合はtrue、存在しないかエラーの場合はfalse
fn check_column_exists(conn: &Connection, table_name: &str, column_name: &str) -> bool {
    let query = format!("PRAGMA table_info({table_name})");

    match conn.prepare(&query) {
        Ok(mut stmt) => {
            match stmt.query_map([], |row| {
                let col_name: String = row.get(1)?;
                Ok(col_name)
            }) {
                Ok(rows) => {
                    for col_name in rows.flatten() {
                        if col_name == column_name {
                            return true;
                        }
                    }
                    false
                }
                Err(_) => false,
            }
        }
        Err(_) => false,
    }
}
