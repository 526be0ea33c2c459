use super::costs;
use super::models::{
    CreateSubscriptionDto, SpendingSummary, Subscription, UpdateSubscriptionDto,
    SUBSCRIPTION_CATEGORIES,
};
use super::repository;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils;
use crate::AppState;

/// カテゴリが定義済みの一覧に含まれるかを検証する
///
/// # 注意
/// 登録・編集時のみの制限であり、保存済みデータには適用しない
fn validate_category_choice(category: &Option<String>) -> AppResult<()> {
    if let Some(category) = category {
        if !SUBSCRIPTION_CATEGORIES.contains(&category.as_str()) {
            return Err(AppError::validation(format!(
                "カテゴリは次のいずれかを指定してください: {}",
                SUBSCRIPTION_CATEGORIES.join(", ")
            )));
        }
    }
    Ok(())
}

/// サブスクリプション作成用DTOのバリデーション
///
/// # 処理内容
/// 各フィールドを検証し、最初に見つかった問題をエラーとして返す。
/// 請求周期は登録時のみ既知の値に制限する（保存済みデータには制限をかけない）
fn validate_create_subscription_dto(dto: &CreateSubscriptionDto) -> AppResult<()> {
    utils::validate_required_field(&dto.name, "サービス名")?;
    utils::validate_text_length(&dto.name, 100, "サービス名")?;
    utils::validate_amount(dto.amount)?;
    utils::validate_currency_code(&dto.currency)?;
    super::models::BillingCycle::parse(&dto.billing_cycle)?;
    utils::validate_date(&dto.next_billing_date)?;
    utils::validate_description(&dto.description)?;
    utils::validate_category(&dto.category)?;
    validate_category_choice(&dto.category)?;
    Ok(())
}

/// サブスクリプション更新用DTOのバリデーション
///
/// # 注意
/// 指定されたフィールドのみを検証する
fn validate_update_subscription_dto(dto: &UpdateSubscriptionDto) -> AppResult<()> {
    if let Some(name) = &dto.name {
        utils::validate_required_field(name, "サービス名")?;
        utils::validate_text_length(name, 100, "サービス名")?;
    }
    if let Some(amount) = dto.amount {
        utils::validate_amount(amount)?;
    }
    if let Some(currency) = &dto.currency {
        utils::validate_currency_code(currency)?;
    }
    if let Some(billing_cycle) = &dto.billing_cycle {
        super::models::BillingCycle::parse(billing_cycle)?;
    }
    if let Some(date) = &dto.next_billing_date {
        utils::validate_date(date)?;
    }
    utils::validate_description(&dto.description)?;
    utils::validate_category(&dto.category)?;
    validate_category_choice(&dto.category)?;
    Ok(())
}

/// サブスクリプション一覧を取得する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `user_id` - 所有ユーザーのID
/// * `active_only` - アクティブなサブスクリプションのみを取得するか
///
/// # 戻り値
/// サブスクリプションのリスト、または失敗時はエラー
pub fn get_subscriptions(
    state: &AppState,
    user_id: &str,
    active_only: bool,
) -> AppResult<Vec<Subscription>> {
    let conn = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

    repository::find_all(&conn, user_id, active_only)
}

/// IDでサブスクリプションを取得する
pub fn get_subscription(state: &AppState, user_id: &str, id: &str) -> AppResult<Subscription> {
    let conn = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

    repository::find_by_id(&conn, id, user_id)
}

/// サブスクリプションを作成する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `user_id` - 所有ユーザーのID
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラー
pub fn create_subscription(
    state: &AppState,
    user_id: &str,
    mut dto: CreateSubscriptionDto,
) -> AppResult<Subscription> {
    dto.name = utils::normalize_string(&dto.name);
    validate_create_subscription_dto(&dto)?;

    let conn = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

    let subscription = repository::create(&conn, dto, user_id)?;
    log::info!("サブスクリプションを作成しました: {}", subscription.name);

    Ok(subscription)
}

/// サブスクリプションを更新する
pub fn update_subscription(
    state: &AppState,
    user_id: &str,
    id: &str,
    mut dto: UpdateSubscriptionDto,
) -> AppResult<Subscription> {
    if let Some(name) = &dto.name {
        dto.name = Some(utils::normalize_string(name));
    }
    validate_update_subscription_dto(&dto)?;

    let conn = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

    let subscription = repository::update(&conn, id, dto, user_id)?;
    log::info!("サブスクリプションを更新しました: {}", subscription.name);

    Ok(subscription)
}

/// サブスクリプションのアクティブ状態を切り替える
pub fn toggle_subscription_status(
    state: &AppState,
    user_id: &str,
    id: &str,
) -> AppResult<Subscription> {
    let conn = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

    let subscription = repository::toggle_status(&conn, id, user_id)?;
    log::info!(
        "サブスクリプションの状態を切り替えました: {} -> {}",
        subscription.name,
        if subscription.is_active {
            "アクティブ"
        } else {
            "停止中"
        }
    );

    Ok(subscription)
}

/// サブスクリプションを削除する
pub fn delete_subscription(state: &AppState, user_id: &str, id: &str) -> AppResult<()> {
    let conn = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;

    repository::delete(&conn, id, user_id)?;
    log::info!("サブスクリプションを削除しました: {id}");

    Ok(())
}

/// 支出サマリーを取得する
///
/// # 処理内容
/// 全サブスクリプションを読み出し、アクティブなもののみを月額・年額換算で集計する
pub fn get_spending_summary(state: &AppState, user_id: &str) -> AppResult<SpendingSummary> {
    let subscriptions = get_subscriptions(state, user_id, false)?;
    Ok(costs::spending_summary(&subscriptions))
}
