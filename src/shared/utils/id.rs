use nanoid::nanoid;
use uuid::Uuid;

/// ユーザーID用のnanoIdを生成する
///
/// # 戻り値
/// 21文字のURL-safeなnanoId
///
/// # 特性
/// - 文字セット: A-Za-z0-9_- (64文字)
/// - 長さ: 21文字
/// - 衝突確率: 1兆個のIDで1%未満
pub fn generate_user_id() -> String {
    nanoid!()
}

/// nanoIdが有効な形式かどうかを検証する
///
/// # 引数
/// * `id` - 検証するID文字列
///
/// # 戻り値
/// 有効な場合はtrue、無効な場合はfalse
///
/// # 検証条件
/// - 長さが21文字
/// - URL-safe文字（A-Za-z0-9_-）のみを含む
pub fn is_valid_nanoid(id: &str) -> bool {
    id.len() == 21
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// サブスクリプションID用のUUID v4を生成する
///
/// # 戻り値
/// ハイフン区切りのUUID文字列（36文字）
pub fn generate_subscription_id() -> String {
    Uuid::new_v4().to_string()
}

/// チェックアウト参照ID用のUUID v4を生成する
///
/// # 戻り値
/// ハイフン区切りのUUID文字列（36文字）
///
/// # 用途
/// 決済プロバイダへ渡すclient_reference_idとして使用する
pub fn generate_checkout_reference() -> String {
    Uuid::new_v4().to_string()
}
