use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// サブスクリプションのカテゴリ一覧
pub const SUBSCRIPTION_CATEGORIES: [&str; 9] = [
    "Entertainment",
    "Software",
    "Health & Fitness",
    "Education",
    "Cloud Storage",
    "Music",
    "Gaming",
    "News",
    "Other",
];

/// サブスクリプションデータモデル
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subscription {
    pub id: String,                  // UUID v4
    pub user_id: String,             // 所有ユーザーのID（nanoid）
    pub name: String,                // サービス名、100文字以内
    pub description: Option<String>, // 説明、500文字以内
    pub amount: f64,                 // 正の数値、10桁以内
    pub currency: String,            // ISO 4217通貨コード（例: "USD"）
    pub billing_cycle: String,       // "weekly" | "monthly" | "quarterly" | "yearly"
    pub next_billing_date: String,   // YYYY-MM-DD形式
    pub category: Option<String>,    // カテゴリ名
    pub is_active: bool,             // 有効/無効
    pub created_at: String,          // RFC3339形式（UTC）
    pub updated_at: String,          // RFC3339形式（UTC）
}

/// 請求周期を表す列挙型
///
/// # 注意
/// データベース上のbilling_cycleは文字列のまま保持する。
/// この列挙型は作成・更新時の入力検証にのみ使用し、
/// 読み出し側は未知の周期値も扱えるようにしている
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    /// 週次請求
    Weekly,
    /// 月次請求
    Monthly,
    /// 四半期請求
    Quarterly,
    /// 年次請求
    Yearly,
}

impl BillingCycle {
    /// すべての請求周期
    pub const ALL: [BillingCycle; 4] = [
        BillingCycle::Weekly,
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::Yearly,
    ];

    /// 請求周期の文字列表現を取得
    ///
    /// # 戻り値
    /// データベースに保存される周期文字列
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }

    /// 周期文字列を解析する
    ///
    /// # 引数
    /// * `value` - 周期文字列
    ///
    /// # 戻り値
    /// 解析された請求周期、または未知の値の場合はエラー
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "weekly" => Ok(BillingCycle::Weekly),
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "yearly" => Ok(BillingCycle::Yearly),
            _ => Err(AppError::validation(format!(
                "請求周期は weekly / monthly / quarterly / yearly のいずれかを指定してください（入力値: {value}）"
            ))),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// サブスクリプション作成用DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSubscriptionDto {
    pub name: String,
    pub description: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: String,
    pub next_billing_date: String,
    pub category: Option<String>,
}

/// サブスクリプション更新用DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateSubscriptionDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    pub next_billing_date: Option<String>,
    pub category: Option<String>,
}

/// 支出サマリー
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpendingSummary {
    /// アクティブなサブスクリプション数
    pub active_count: usize,
    /// 月額換算の合計金額
    pub monthly_total: f64,
    /// 年額換算の合計金額
    pub yearly_total: f64,
}
