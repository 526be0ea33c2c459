use super::models::{CreateSubscriptionDto, Subscription, UpdateSubscriptionDto};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{self, id};
use rusqlite::{params, Connection, Row};

/// 検索クエリで共通に使用するカラム並び
const SUBSCRIPTION_COLUMNS: &str = "id, user_id, name, description, amount, currency, \
     billing_cycle, next_billing_date, category, is_active, created_at, updated_at";

/// 行をサブスクリプションモデルに変換する
///
/// # 注意
/// is_activeはNULL許容カラムのため、NULLはfalseとして読み出す
fn map_row(row: &Row) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        currency: row.get(5)?,
        billing_cycle: row.get(6)?,
        next_billing_date: row.get(7)?,
        category: row.get(8)?,
        is_active: row.get::<_, Option<i64>>(9)?.unwrap_or(0) != 0,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// サブスクリプションを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - サブスクリプション作成用DTO
/// * `user_id` - 所有ユーザーのID
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラー
pub fn create(
    conn: &Connection,
    dto: CreateSubscriptionDto,
    user_id: &str,
) -> AppResult<Subscription> {
    let subscription_id = id::generate_subscription_id();
    let now = utils::get_current_timestamp();

    conn.execute(
        "INSERT INTO subscriptions (id, user_id, name, description, amount, currency, billing_cycle, next_billing_date, category, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?11)",
        params![
            subscription_id,
            user_id,
            dto.name,
            dto.description,
            dto.amount,
            dto.currency,
            dto.billing_cycle,
            dto.next_billing_date,
            dto.category,
            now,
            now
        ],
    )?;

    find_by_id(conn, &subscription_id, user_id)
}

/// IDでサブスクリプションを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `user_id` - 所有ユーザーのID
///
/// # 戻り値
/// サブスクリプション、または失敗時はエラー
pub fn find_by_id(conn: &Connection, id: &str, user_id: &str) -> AppResult<Subscription> {
    let query = format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1 AND user_id = ?2"
    );

    conn.query_row(&query, params![id, user_id], map_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::NotFound(format!("ID {id} のサブスクリプションが見つかりません"))
            }
            _ => AppError::Database(e.to_string()),
        })
}

/// サブスクリプション一覧を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーのID
/// * `active_only` - アクティブなサブスクリプションのみを取得するか
///
/// # 戻り値
/// 作成日時の新しい順に並んだサブスクリプションのリスト、または失敗時はエラー
pub fn find_all(
    conn: &Connection,
    user_id: &str,
    active_only: bool,
) -> AppResult<Vec<Subscription>> {
    let query = if active_only {
        format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
             WHERE user_id = ?1 AND is_active = 1 ORDER BY created_at DESC"
        )
    } else {
        format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
             WHERE user_id = ?1 ORDER BY created_at DESC"
        )
    };

    let mut stmt = conn.prepare(&query)?;
    let subscriptions = stmt.query_map([user_id], map_row)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// サブスクリプションを更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `dto` - サブスクリプション更新用DTO
/// * `user_id` - 所有ユーザーのID
///
/// # 戻り値
/// 更新されたサブスクリプション、または失敗時はエラー
///
/// # 処理内容
/// 指定されなかったフィールドは既存の値を維持する
pub fn update(
    conn: &Connection,
    id: &str,
    dto: UpdateSubscriptionDto,
    user_id: &str,
) -> AppResult<Subscription> {
    let now = utils::get_current_timestamp();

    // 既存のサブスクリプションを取得
    let existing = find_by_id(conn, id, user_id)?;

    // 更新するフィールドを決定
    let name = dto.name.unwrap_or(existing.name);
    let description = dto.description.or(existing.description);
    let amount = dto.amount.unwrap_or(existing.amount);
    let currency = dto.currency.unwrap_or(existing.currency);
    let billing_cycle = dto.billing_cycle.unwrap_or(existing.billing_cycle);
    let next_billing_date = dto.next_billing_date.unwrap_or(existing.next_billing_date);
    let category = dto.category.or(existing.category);

    conn.execute(
        "UPDATE subscriptions
         SET name = ?1, description = ?2, amount = ?3, currency = ?4, billing_cycle = ?5,
             next_billing_date = ?6, category = ?7, updated_at = ?8
         WHERE id = ?9 AND user_id = ?10",
        params![
            name,
            description,
            amount,
            currency,
            billing_cycle,
            next_billing_date,
            category,
            now,
            id,
            user_id
        ],
    )?;

    find_by_id(conn, id, user_id)
}

/// サブスクリプションのアクティブ状態を切り替える
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `user_id` - 所有ユーザーのID
///
/// # 戻り値
/// 更新されたサブスクリプション、または失敗時はエラー
///
/// # 注意
/// is_activeがNULLの行はfalse扱いなので、切り替え後はtrueになる
pub fn toggle_status(conn: &Connection, id: &str, user_id: &str) -> AppResult<Subscription> {
    let now = utils::get_current_timestamp();

    let rows_affected = conn.execute(
        "UPDATE subscriptions
         SET is_active = CASE WHEN COALESCE(is_active, 0) = 0 THEN 1 ELSE 0 END, updated_at = ?1
         WHERE id = ?2 AND user_id = ?3",
        params![now, id, user_id],
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "ID {id} のサブスクリプションが見つかりません"
        )));
    }

    find_by_id(conn, id, user_id)
}

/// サブスクリプションを削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `user_id` - 所有ユーザーのID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete(conn: &Connection, id: &str, user_id: &str) -> AppResult<()> {
    let rows_affected = conn.execute(
        "DELETE FROM subscriptions WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "ID {id} のサブスクリプションが見つかりません"
        )));
    }

    Ok(())
}
