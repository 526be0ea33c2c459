use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ユーザー情報を表す構造体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// ユーザーID（nanoId形式）
    pub id: String,
    /// 認証プロバイダー側のユーザーID
    pub provider_id: String,
    /// メールアドレス
    pub email: String,
    /// 表示名
    pub name: String,
    /// プロフィール画像URL
    pub picture_url: Option<String>,
    /// 契約プラン（free / pro）
    pub plan: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 更新日時
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Proプランに加入しているかどうかを返す
    pub fn is_pro(&self) -> bool {
        self.plan == "pro"
    }
}

/// 認証プロバイダーから取得したユーザー情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    /// プロバイダー側のユーザーID
    pub id: String,
    /// メールアドレス
    pub email: String,
    /// 表示名
    pub name: String,
    /// プロフィール画像URL
    pub picture: Option<String>,
}

/// 認証状態を表す構造体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    /// ユーザー情報
    pub user: Option<User>,
    /// 認証済みフラグ
    pub is_authenticated: bool,
    /// 最終ログイン日時（RFC3339形式）
    pub last_login: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            last_login: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(plan: &str) -> User {
        User {
            id: "user-1".to_string(),
            provider_id: "provider-1".to_string(),
            email: "test@example.com".to_string(),
            name: "テストユーザー".to_string(),
            picture_url: None,
            plan: plan.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_pro() {
        assert!(!sample_user("free").is_pro());
        assert!(sample_user("pro").is_pro());
        // 未知のプランはfreeと同じ扱い
        assert!(!sample_user("enterprise").is_pro());
    }

    #[test]
    fn test_auth_state_default() {
        let state = AuthState::default();
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert!(state.last_login.is_none());
    }
}
