use clap::Parser;
use orano_sabusuku_lib::cli::{self, AppContext, Cli};
use orano_sabusuku_lib::shared::config::environment::{
    initialize_logging_system, load_environment_variables,
};

#[tokio::main]
async fn main() {
    // 環境に応じた.envファイルを読み込み（ログシステム初期化前に実行）
    load_environment_variables();

    // ログシステムを初期化（.envファイル読み込み後）
    initialize_logging_system();

    let args = Cli::parse();

    let result = run(args).await;

    if let Err(e) = result {
        log::error!("コマンドの実行に失敗しました: {e}");
        eprintln!("エラー: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> orano_sabusuku_lib::shared::errors::AppResult<()> {
    let ctx = AppContext::initialize(args.database)?;
    cli::execute(args.command, &ctx).await
}
