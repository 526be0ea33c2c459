/// コマンドラインインターフェース
///
/// サブコマンドの定義と、各サブコマンドから機能モジュールへのディスパッチを提供します。
use crate::features::auth::{AuthService, SessionStore};
use crate::features::billing::{BillingService, PlanTier, PRO_FEATURES};
use crate::features::subscriptions::{
    self, costs, CreateSubscriptionDto, Subscription, UpdateSubscriptionDto,
};
use crate::shared::api_client::ApiClient;
use crate::shared::config::environment::SecurityConfig;
use crate::shared::config::initialization::initialize_application;
use crate::shared::database;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils;
use crate::AppState;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "orano-sabusuku", version, about = "サブスクリプション支出トラッカー")]
pub struct Cli {
    /// データベースファイルのパス（省略時はアプリデータディレクトリ）
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// セッショントークンでサインインする
    Login {
        /// APIサーバーが発行したセッショントークン
        #[arg(long, env = "ORANO_SESSION_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// サインアウトする
    Logout,

    /// サインイン中のユーザーを表示する
    Whoami,

    /// サブスクリプションを登録する
    Add {
        /// サービス名
        #[arg(long)]
        name: String,

        /// 金額
        #[arg(long)]
        amount: f64,

        /// 請求周期（weekly / monthly / quarterly / yearly）
        #[arg(long)]
        cycle: String,

        /// 通貨コード（省略時はUSD）
        #[arg(long)]
        currency: Option<String>,

        /// 次回請求日（YYYY-MM-DD、省略時は今日）
        #[arg(long)]
        next_billing: Option<String>,

        /// カテゴリ
        #[arg(long)]
        category: Option<String>,

        /// 説明
        #[arg(long)]
        description: Option<String>,
    },

    /// サブスクリプション一覧を表示する
    List {
        /// アクティブなサブスクリプションのみを表示する
        #[arg(long)]
        active: bool,
    },

    /// サブスクリプションの詳細を表示する
    Show {
        /// サブスクリプションID
        id: String,
    },

    /// サブスクリプションを編集する
    Edit {
        /// サブスクリプションID
        id: String,

        /// サービス名
        #[arg(long)]
        name: Option<String>,

        /// 金額
        #[arg(long)]
        amount: Option<f64>,

        /// 請求周期（weekly / monthly / quarterly / yearly）
        #[arg(long)]
        cycle: Option<String>,

        /// 通貨コード
        #[arg(long)]
        currency: Option<String>,

        /// 次回請求日（YYYY-MM-DD）
        #[arg(long)]
        next_billing: Option<String>,

        /// カテゴリ
        #[arg(long)]
        category: Option<String>,

        /// 説明
        #[arg(long)]
        description: Option<String>,
    },

    /// サブスクリプションを削除する
    Remove {
        /// サブスクリプションID
        id: String,
    },

    /// サブスクリプションの有効/停止を切り替える
    Toggle {
        /// サブスクリプションID
        id: String,
    },

    /// 月額・年額換算の支出サマリーを表示する
    Summary,

    /// Proプランへのアップグレードを開始する
    Upgrade,

    /// 決済完了後にプランを確認・反映する
    Confirm,

    /// 現在の契約プランを表示する
    Plan,

    /// データベースのバックアップを作成する
    Backup {
        /// バックアップ先のファイルパス
        destination: PathBuf,
    },
}

/// サブコマンド実行に必要なサービス一式
pub struct AppContext {
    /// アプリケーション状態
    pub state: AppState,
    /// 認証サービス
    pub auth: AuthService,
    /// 課金サービス
    pub billing: BillingService,
}

impl AppContext {
    /// アプリケーションを初期化してAppContextを構築する
    ///
    /// # 引数
    /// * `database_override` - データベースファイルのパス（Noneの場合はデフォルト）
    ///
    /// # 戻り値
    /// AppContextインスタンス、初期化に失敗した場合はエラー
    pub fn initialize(database_override: Option<PathBuf>) -> AppResult<Self> {
        let init_result = initialize_application(database_override)?;

        let conn = database::initialize_database(&init_result.database_path)?;
        let state = AppState::new(conn);

        // セッションストアはデータベースと同じディレクトリに配置する
        let store_dir = init_result
            .database_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let security_config = SecurityConfig::from_env();
        let session_store = SessionStore::new(store_dir, &security_config.encryption_key);

        let api = ApiClient::new()?;
        let auth = AuthService::new(api.clone(), state.db_handle(), session_store);
        let billing = BillingService::new(api, state.db_handle());

        Ok(Self {
            state,
            auth,
            billing,
        })
    }
}

/// サブコマンドを実行する
///
/// # 引数
/// * `command` - 実行するサブコマンド
/// * `ctx` - サービス一式
///
/// # 戻り値
/// 処理結果
pub async fn execute(command: Commands, ctx: &AppContext) -> AppResult<()> {
    match command {
        Commands::Login { token } => {
            let user = ctx.auth.sign_in(&token).await?;
            println!("サインインしました: {} ({})", user.name, user.email);
            Ok(())
        }

        Commands::Logout => {
            ctx.auth.sign_out()?;
            println!("サインアウトしました");
            Ok(())
        }

        Commands::Whoami => {
            let auth_state = ctx.auth.get_auth_state();
            match auth_state.user {
                Some(user) => {
                    println!("ユーザー: {}", user.name);
                    println!("メール: {}", user.email);
                    println!("プラン: {}", PlanTier::from_plan(&user.plan).label());
                    if let Some(last_login) = auth_state.last_login {
                        println!("最終ログイン: {last_login}");
                    }
                }
                None => println!("サインインしていません"),
            }
            Ok(())
        }

        Commands::Add {
            name,
            amount,
            cycle,
            currency,
            next_billing,
            category,
            description,
        } => {
            let user = ctx.auth.require_user()?;

            let dto = CreateSubscriptionDto {
                name,
                description,
                amount,
                currency: currency.unwrap_or_else(|| costs::DEFAULT_CURRENCY.to_string()),
                billing_cycle: cycle,
                next_billing_date: next_billing.unwrap_or_else(utils::get_today_date),
                category,
            };

            let subscription = subscriptions::create_subscription(&ctx.state, &user.id, dto)?;
            println!(
                "登録しました: {} ({})",
                subscription.name, subscription.id
            );
            Ok(())
        }

        Commands::List { active } => {
            let user = ctx.auth.require_user()?;

            let items = subscriptions::get_subscriptions(&ctx.state, &user.id, active)?;
            if items.is_empty() {
                println!("サブスクリプションがありません");
                return Ok(());
            }

            println!("{}", render_subscription_table(&items));
            Ok(())
        }

        Commands::Show { id } => {
            let user = ctx.auth.require_user()?;

            let subscription = subscriptions::get_subscription(&ctx.state, &user.id, &id)?;
            print_subscription_detail(&subscription);
            Ok(())
        }

        Commands::Edit {
            id,
            name,
            amount,
            cycle,
            currency,
            next_billing,
            category,
            description,
        } => {
            let user = ctx.auth.require_user()?;

            let dto = UpdateSubscriptionDto {
                name,
                description,
                amount,
                currency,
                billing_cycle: cycle,
                next_billing_date: next_billing,
                category,
            };

            if is_empty_update(&dto) {
                return Err(AppError::validation("更新する項目が指定されていません"));
            }

            let subscription = subscriptions::update_subscription(&ctx.state, &user.id, &id, dto)?;
            println!("更新しました: {}", subscription.name);
            Ok(())
        }

        Commands::Remove { id } => {
            let user = ctx.auth.require_user()?;

            subscriptions::delete_subscription(&ctx.state, &user.id, &id)?;
            println!("削除しました: {id}");
            Ok(())
        }

        Commands::Toggle { id } => {
            let user = ctx.auth.require_user()?;

            let subscription = subscriptions::toggle_subscription_status(&ctx.state, &user.id, &id)?;
            if subscription.is_active {
                println!("有効にしました: {}", subscription.name);
            } else {
                println!("停止しました: {}", subscription.name);
            }
            Ok(())
        }

        Commands::Summary => {
            let user = ctx.auth.require_user()?;

            let summary = subscriptions::get_spending_summary(&ctx.state, &user.id)?;

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(vec![
                Cell::new("アクティブ件数").fg(Color::Cyan),
                Cell::new("月額合計").fg(Color::Cyan),
                Cell::new("年額合計").fg(Color::Cyan),
            ]);

            table.add_row(vec![
                Cell::new(summary.active_count),
                Cell::new(costs::format_currency(summary.monthly_total, None)),
                Cell::new(costs::format_currency(summary.yearly_total, None)),
            ]);

            println!("{table}");
            Ok(())
        }

        Commands::Upgrade => {
            let (user, token) = ctx.auth.require_session()?;

            if user.is_pro() {
                println!("すでにProプランをご利用中です");
                return Ok(());
            }

            let session = ctx.billing.start_checkout(&token).await?;
            println!("以下のURLをブラウザで開いて決済を完了してください:");
            println!();
            println!("  {}", session.checkout_url);
            println!();
            println!("決済完了後、`confirm` コマンドでプランを反映できます");
            Ok(())
        }

        Commands::Confirm => {
            let (user, token) = ctx.auth.require_session()?;

            let updated = ctx.billing.sync_plan(&user, &token).await?;
            if updated.is_pro() {
                println!("Proプランが有効になりました！");
            } else {
                println!("決済がまだ完了していません。時間をおいて再度お試しください");
            }
            Ok(())
        }

        Commands::Plan => {
            let user = ctx.auth.require_user()?;

            let tier = PlanTier::from_plan(&user.plan);
            println!("現在のプラン: {}", tier.label());

            if tier == PlanTier::Free {
                println!();
                println!("Proプランで利用できる機能:");
                for feature in PRO_FEATURES {
                    println!("  - {feature}");
                }
                println!();
                println!("`upgrade` コマンドでアップグレードできます");
            }
            Ok(())
        }

        Commands::Backup { destination } => {
            let conn = ctx
                .state
                .db
                .lock()
                .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

            database::backup_database(&conn, &destination)?;
            println!("バックアップを作成しました: {}", destination.display());
            Ok(())
        }
    }
}

/// サブスクリプションの詳細を表示する
fn print_subscription_detail(subscription: &Subscription) {
    let currency = Some(subscription.currency.as_str());
    let monthly = costs::monthly_equivalent(subscription.amount, &subscription.billing_cycle);
    let yearly = costs::yearly_equivalent(subscription.amount, &subscription.billing_cycle);

    println!("サービス: {}", subscription.name);
    println!("ID: {}", subscription.id);
    println!(
        "金額: {} / {}",
        costs::format_currency(subscription.amount, currency),
        subscription.billing_cycle
    );
    println!("月額換算: {}", costs::format_currency(monthly, currency));
    println!("年額換算: {}", costs::format_currency(yearly, currency));
    println!("次回請求日: {}", subscription.next_billing_date);
    if let Some(category) = &subscription.category {
        println!("カテゴリ: {category}");
    }
    if let Some(description) = &subscription.description {
        println!("説明: {description}");
    }
    println!(
        "状態: {}",
        if subscription.is_active {
            "アクティブ"
        } else {
            "停止中"
        }
    );
}

/// 更新DTOに指定された項目がひとつもないかどうかを返す
fn is_empty_update(dto: &UpdateSubscriptionDto) -> bool {
    dto.name.is_none()
        && dto.description.is_none()
        && dto.amount.is_none()
        && dto.currency.is_none()
        && dto.billing_cycle.is_none()
        && dto.next_billing_date.is_none()
        && dto.category.is_none()
}

/// サブスクリプション一覧をテーブル形式に整形する
fn render_subscription_table(subscriptions: &[Subscription]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("サービス").fg(Color::Cyan),
        Cell::new("金額").fg(Color::Cyan),
        Cell::new("周期").fg(Color::Cyan),
        Cell::new("月額換算").fg(Color::Cyan),
        Cell::new("次回請求日").fg(Color::Cyan),
        Cell::new("カテゴリ").fg(Color::Cyan),
        Cell::new("状態").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);

    for subscription in subscriptions {
        let monthly = costs::monthly_equivalent(subscription.amount, &subscription.billing_cycle);

        let status_cell = if subscription.is_active {
            Cell::new("アクティブ").fg(Color::Green)
        } else {
            Cell::new("停止中").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(&subscription.name),
            Cell::new(costs::format_currency(
                subscription.amount,
                Some(subscription.currency.as_str()),
            )),
            Cell::new(&subscription.billing_cycle),
            Cell::new(costs::format_currency(
                monthly,
                Some(subscription.currency.as_str()),
            )),
            Cell::new(&subscription.next_billing_date),
            Cell::new(subscription.category.as_deref().unwrap_or("-")),
            status_cell,
            Cell::new(&subscription.id),
        ]);
    }

    table
}
