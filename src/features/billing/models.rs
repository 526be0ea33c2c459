use serde::{Deserialize, Serialize};

/// Proプランで利用できる機能の一覧（表示用）
pub const PRO_FEATURES: [&str; 5] = [
    "Unlimited subscriptions",
    "Analytics Dashboard with visual charts",
    "Email notifications 7 days before renewals",
    "SMS notifications 2 days before renewals",
    "Priority support",
];

/// 契約プラン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
}

impl PlanTier {
    /// データベースやAPIで使用する文字列表現を返す
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
        }
    }

    /// 保存されたプラン文字列をプランに変換する
    ///
    /// # 注意
    /// 未知の値はfreeプランとして扱う
    pub fn from_plan(value: &str) -> Self {
        match value {
            "pro" => PlanTier::Pro,
            _ => PlanTier::Free,
        }
    }

    /// 表示用のプラン名を返す
    pub fn label(&self) -> &'static str {
        match self {
            PlanTier::Free => "Free",
            PlanTier::Pro => "Pro",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 開始されたチェックアウトセッション
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// 決済ページのURL（ブラウザで開く）
    pub checkout_url: String,
    /// クライアント側で生成した参照ID
    pub reference: String,
}
