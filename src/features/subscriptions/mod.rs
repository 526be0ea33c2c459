/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション管理に関連するすべての機能を提供します：
/// - サブスクリプションの作成、読み取り、更新、削除
/// - サブスクリプションの有効/無効切り替え
/// - 月額・年額換算と支出サマリーの計算
/// - 表示用の通貨フォーマット
pub mod commands;
pub mod costs;
pub mod models;
pub mod repository;

// 公開インターフェース
pub use commands::{
    create_subscription, delete_subscription, get_spending_summary, get_subscription,
    get_subscriptions, toggle_subscription_status, update_subscription,
};

pub use costs::{
    format_currency, monthly_equivalent, spending_summary, total_monthly_cost, total_yearly_cost,
    yearly_equivalent, DEFAULT_CURRENCY,
};

pub use models::{
    BillingCycle, CreateSubscriptionDto, SpendingSummary, Subscription, UpdateSubscriptionDto,
    SUBSCRIPTION_CATEGORIES,
};
