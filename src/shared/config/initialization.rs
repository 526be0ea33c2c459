use crate::shared::config::{get_environment, Environment};
use crate::shared::database;
use crate::shared::errors::AppResult;
use std::path::PathBuf;

/// アプリケーション初期化の結果を表す構造体
#[derive(Debug)]
pub struct InitializationResult {
    /// 初回起動かどうか
    pub is_first_run: bool,
    /// データベースファイルのパス
    pub database_path: PathBuf,
    /// 実行環境
    pub environment: Environment,
}

/// アプリケーションの初期化を実行する
///
/// # 引数
/// * `database_override` - データベースファイルパスの明示指定（CLIオプション）
///
/// # 戻り値
/// 初期化結果、または失敗時はエラー
///
/// # 処理内容
/// 1. 実行環境の判定
/// 2. データベースファイルパスの決定（明示指定があれば優先）
/// 3. 初回起動の判定
pub fn initialize_application(
    database_override: Option<PathBuf>,
) -> AppResult<InitializationResult> {
    // 現在の実行環境を取得
    let environment = get_environment();

    // データベースファイルパスを決定
    let database_path = match database_override {
        Some(path) => {
            log::debug!("データベースパスを明示指定から使用: {:?}", path);
            path
        }
        None => database::get_database_path()?,
    };

    // 初回起動かどうかを判定（データベースファイルの存在で判定）
    let is_first_run = !database_path.exists();

    // 初回起動の場合、初期化ログを出力
    if is_first_run {
        log_first_run_initialization(&environment, &database_path);
    }

    Ok(InitializationResult {
        is_first_run,
        database_path,
        environment,
    })
}

/// 初回起動時の初期化ログを出力する
///
/// # 引数
/// * `environment` - 実行環境
/// * `database_path` - データベースファイルパス
fn log_first_run_initialization(environment: &Environment, database_path: &PathBuf) {
    log::info!("=== アプリケーション初回起動 ===");
    log::info!("実行環境: {environment:?}");
    log::info!("データベースファイル: {database_path:?}");
    log::info!("初期化を開始します...");
}

/// 初期化完了ログを出力する
///
/// # 引数
/// * `result` - 初期化結果
pub fn log_initialization_complete(result: &InitializationResult) {
    if result.is_first_run {
        log::info!("=== 初期化完了 ===");
        log::info!("初回起動の初期化が正常に完了しました");
    } else {
        log::debug!("アプリケーション起動完了（既存データベースを使用）");
    }
    log::debug!("環境: {:?}", result.environment);
    log::debug!("データベース: {:?}", result.database_path);
}
