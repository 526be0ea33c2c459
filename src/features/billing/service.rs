/// APIサーバー経由の課金サービス
///
/// 決済処理はAPIサーバーがホスティングする決済ページに委譲します。
/// アプリ側はチェックアウトの開始と、決済完了後のプラン同期のみを行います。
use crate::features::auth::models::User;
use crate::features::auth::repository::UserRepository;
use crate::features::billing::models::{CheckoutSession, PlanTier};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::id;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// チェックアウト開始エンドポイント
const CHECKOUT_ENDPOINT: &str = "/api/v1/billing/checkout";
/// 契約状態の取得エンドポイント
const STATUS_ENDPOINT: &str = "/api/v1/billing/status";

/// APIサーバーへのチェックアウト開始リクエスト
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// 購入するプラン
    pub plan: String,
    /// クライアント側で生成した参照ID
    pub client_reference_id: String,
}

/// APIサーバーからのチェックアウト開始レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// 決済ページのURL
    pub checkout_url: String,
}

/// APIサーバーからの契約状態レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BillingStatusResponse {
    /// サーバー側で確定している契約プラン
    pub plan: String,
}

/// 課金サービス
#[derive(Clone)]
pub struct BillingService {
    /// APIクライアント
    api: ApiClient,
    /// ユーザーリポジトリ
    users: UserRepository,
}

impl BillingService {
    /// 新しいBillingServiceを作成する
    ///
    /// # 引数
    /// * `api` - APIクライアント
    /// * `db_connection` - データベース接続
    ///
    /// # 戻り値
    /// BillingServiceインスタンス
    pub fn new(api: ApiClient, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            api,
            users: UserRepository::new(db_connection),
        }
    }

    /// Proプランへのチェックアウトを開始する
    ///
    /// # 引数
    /// * `token` - セッショントークン
    ///
    /// # 戻り値
    /// チェックアウトセッション（決済ページのURLを含む）、失敗時はエラー
    ///
    /// # 処理内容
    /// 参照IDを生成してAPIサーバーにチェックアウト開始を依頼する。
    /// 実際の決済はブラウザで開いた決済ページ上で行われる
    pub async fn start_checkout(&self, token: &str) -> AppResult<CheckoutSession> {
        let reference = id::generate_checkout_reference();

        let request = CheckoutRequest {
            plan: PlanTier::Pro.as_str().to_string(),
            client_reference_id: reference.clone(),
        };

        log::debug!("APIサーバーにチェックアウト開始リクエストを送信: {CHECKOUT_ENDPOINT}");

        let response: CheckoutResponse = self
            .api
            .post(CHECKOUT_ENDPOINT, &request, Some(token))
            .await
            .map_err(|e| match e {
                AppError::Authentication(msg) => AppError::Authentication(msg),
                other => AppError::payment(format!("チェックアウトの開始に失敗しました: {other}")),
            })?;

        // 決済ページはHTTPSのみ許可する（ローカル開発サーバーは例外）
        if !response.checkout_url.starts_with("https://") && !self.api.is_localhost() {
            return Err(AppError::payment(format!(
                "決済ページのURLが安全ではありません: {}",
                response.checkout_url
            )));
        }

        log::info!("チェックアウトセッションを開始しました: reference={reference}");

        Ok(CheckoutSession {
            checkout_url: response.checkout_url,
            reference,
        })
    }

    /// サーバー側の契約プランを取得してローカルに同期する
    ///
    /// # 引数
    /// * `user` - サインイン済みユーザー
    /// * `token` - セッショントークン
    ///
    /// # 戻り値
    /// 同期後のユーザー情報、失敗時はエラー
    ///
    /// # 処理内容
    /// 決済完了の反映には時間がかかることがあるため、
    /// 呼び出し側は返されたユーザーのプランを確認すること
    pub async fn sync_plan(&self, user: &User, token: &str) -> AppResult<User> {
        log::debug!("APIサーバーに契約状態リクエストを送信: {STATUS_ENDPOINT}");

        let status: BillingStatusResponse = self
            .api
            .get(STATUS_ENDPOINT, Some(token))
            .await
            .map_err(|e| match e {
                AppError::Authentication(msg) => AppError::Authentication(msg),
                other => AppError::payment(format!("契約状態の取得に失敗しました: {other}")),
            })?;

        if status.plan == user.plan {
            log::debug!("契約プランに変更はありません: plan={}", user.plan);
            return Ok(user.clone());
        }

        let updated = self.users.update_plan(&user.id, &status.plan)?;
        log::info!(
            "契約プランを同期しました: {} -> {}",
            user.plan,
            updated.plan
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_wire_format() {
        let request = CheckoutRequest {
            plan: "pro".to_string(),
            client_reference_id: "ref-123".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["plan"], "pro");
        assert_eq!(json["client_reference_id"], "ref-123");
    }

    #[test]
    fn test_checkout_response_parse() {
        let json = r#"{"checkout_url": "https://pay.example.com/session/abc"}"#;

        let response: CheckoutResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.checkout_url, "https://pay.example.com/session/abc");
    }

    #[test]
    fn test_billing_status_response_parse() {
        let json = r#"{"plan": "pro"}"#;

        let response: BillingStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.plan, "pro");
    }
}
