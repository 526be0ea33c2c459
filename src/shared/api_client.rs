use crate::shared::config::environment::ApiConfig;
/// 汎用APIクライアント
///
/// APIサーバーとの通信を行う汎用的なクライアント
/// セッション検証、チェックアウトなどのAPIエンドポイントで使用する
use crate::shared::errors::{AppError, AppResult};
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// APIサーバーからのエラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// 汎用APIクライアント
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// 新しいAPIクライアントを作成
    pub fn new() -> AppResult<Self> {
        let config = ApiConfig::from_env();
        Self::new_with_config(config)
    }

    /// 設定を指定してAPIクライアントを作成
    pub fn new_with_config(config: ApiConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::Configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self { client, config })
    }

    /// APIサーバーがlocalhostかどうかを判定
    pub fn is_localhost(&self) -> bool {
        self.config.is_localhost()
    }

    /// GETリクエストを送信
    pub async fn get<T>(&self, endpoint: &str, auth_token: Option<&str>) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        debug!("GETリクエスト送信: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        let mut request = self.client.get(&url);

        // 認証トークンがある場合は追加
        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        self.send_request_with_retry(request, "GET", endpoint).await
    }

    /// POSTリクエストを送信
    pub async fn post<B, T>(&self, endpoint: &str, body: &B, auth_token: Option<&str>) -> AppResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        debug!("POSTリクエスト送信: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        let mut request = self.client.post(&url).json(body);

        // 認証トークンがある場合は追加
        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        self.send_request_with_retry(request, "POST", endpoint)
            .await
    }

    /// リトライ機能付きでリクエストを送信
    ///
    /// # 処理内容
    /// - 接続エラーは指数バックオフでリトライする
    /// - 401/403は認証エラーとして返す（リトライしない）
    /// - その他の失敗ステータスは外部サービスエラーとして返す
    async fn send_request_with_retry<T>(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        endpoint: &str,
    ) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let mut attempts = 0;
        loop {
            match request.try_clone() {
                Some(cloned_request) => match cloned_request.send().await {
                    Ok(response) => {
                        if response.status().is_success() {
                            let result: T = response.json().await.map_err(|e| {
                                AppError::ExternalService(format!("レスポンス解析エラー: {e}"))
                            })?;

                            debug!("{method}リクエスト成功: endpoint={endpoint}");
                            return Ok(result);
                        } else {
                            let status_code = response.status().as_u16();
                            let error_response = self.handle_error_response(response).await?;

                            // 認証失敗はリトライ対象外。呼び出し側で再サインインを促す
                            if status_code == 401 || status_code == 403 {
                                return Err(AppError::Authentication(
                                    error_response.error.message,
                                ));
                            }

                            return Err(AppError::ExternalService(format!(
                                "APIサーバーエラー: {} - {}",
                                error_response.error.code, error_response.error.message
                            )));
                        }
                    }
                    Err(e) => {
                        if attempts < self.config.max_retries {
                            attempts += 1;
                            let delay = Duration::from_secs(2_u64.pow(attempts));
                            warn!(
                                    "APIリクエスト失敗、リトライします: attempt={attempts}/{}, delay={delay:?}",
                                    self.config.max_retries
                                );
                            tokio::time::sleep(delay).await;
                            continue;
                        } else {
                            return Err(AppError::ExternalService(format!(
                                "APIサーバーへの接続に失敗しました: {e}"
                            )));
                        }
                    }
                },
                None => {
                    return Err(AppError::ExternalService(
                        "リクエストのクローンに失敗しました".to_string(),
                    ));
                }
            }
        }
    }

    /// エラーレスポンスを処理し、詳細なエラー情報を提供
    async fn handle_error_response(&self, response: Response) -> AppResult<ErrorResponse> {
        let status = response.status();
        let status_code = status.as_u16();

        // レスポンスヘッダーからリクエストIDを取得
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        // JSONエラーレスポンスの解析を試行
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
            // APIサーバーからの構造化エラーレスポンス
            debug!(
                "APIサーバーから構造化エラーレスポンスを受信: code={}, message={}",
                error_response.error.code, error_response.error.message
            );
            Ok(error_response)
        } else {
            // JSONでない場合は汎用エラーレスポンスを作成
            let (error_code, user_message) = match status_code {
                400 => ("BAD_REQUEST", "リクエストの形式が正しくありません"),
                401 => (
                    "UNAUTHORIZED",
                    "認証に失敗しました。再度ログインしてください",
                ),
                403 => ("FORBIDDEN", "この操作を実行する権限がありません"),
                404 => ("NOT_FOUND", "指定されたリソースが見つかりません"),
                429 => (
                    "TOO_MANY_REQUESTS",
                    "リクエストが多すぎます。しばらく待ってから再試行してください",
                ),
                500 => ("INTERNAL_SERVER_ERROR", "サーバー内部エラーが発生しました"),
                502 => ("BAD_GATEWAY", "APIサーバーとの通信でエラーが発生しました"),
                503 => ("SERVICE_UNAVAILABLE", "APIサーバーが一時的に利用できません"),
                504 => (
                    "GATEWAY_TIMEOUT",
                    "APIサーバーからの応答がタイムアウトしました",
                ),
                _ => ("UNKNOWN_ERROR", "不明なエラーが発生しました"),
            };

            warn!(
                "APIサーバーから非構造化エラーレスポンス: status={status_code}, body={response_text}"
            );

            Ok(ErrorResponse {
                error: ErrorDetail {
                    code: error_code.to_string(),
                    message: user_message.to_string(),
                    details: Some(serde_json::json!({
                        "http_status": status_code,
                        "raw_response": response_text,
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                    request_id,
                },
            })
        }
    }
}
