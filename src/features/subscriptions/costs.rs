use super::models::{SpendingSummary, Subscription};

/// 1ヶ月あたりの平均週数
///
/// 週次請求を月額換算する際の係数。52週/12ヶ月の概算値として
/// 4.33を使用する（端数切り捨てではなく固定値）
pub const WEEKS_PER_MONTH: f64 = 4.33;

/// デフォルト通貨コード
pub const DEFAULT_CURRENCY: &str = "USD";

/// 請求金額を月額換算する
///
/// # 引数
/// * `amount` - 請求周期ごとの金額
/// * `billing_cycle` - 請求周期文字列
///
/// # 戻り値
/// 月額換算された金額
///
/// # 換算規則
/// - "weekly": 金額 × 4.33
/// - "monthly": 金額そのまま
/// - "quarterly": 金額 ÷ 3
/// - "yearly": 金額 ÷ 12
/// - 上記以外: 0（エラーにはしない）
///
/// # 注意
/// 未知の周期値は合計を汚染しないよう0として扱う。
/// 周期値の検証は書き込み側のバリデーションが担当する
pub fn monthly_equivalent(amount: f64, billing_cycle: &str) -> f64 {
    match billing_cycle {
        "weekly" => amount * WEEKS_PER_MONTH,
        "monthly" => amount,
        "quarterly" => amount / 3.0,
        "yearly" => amount / 12.0,
        _ => 0.0,
    }
}

/// 請求金額を年額換算する
///
/// # 引数
/// * `amount` - 請求周期ごとの金額
/// * `billing_cycle` - 請求周期文字列
///
/// # 戻り値
/// 年額換算された金額（常に月額換算の12倍）
pub fn yearly_equivalent(amount: f64, billing_cycle: &str) -> f64 {
    monthly_equivalent(amount, billing_cycle) * 12.0
}

/// アクティブなサブスクリプションの月額合計を計算する
///
/// # 引数
/// * `subscriptions` - サブスクリプションのリスト
///
/// # 戻り値
/// アクティブなサブスクリプションの月額換算合計
///
/// # 処理内容
/// is_activeがtrueのものだけを月額換算して合算する。
/// 空のリストは0を返す
pub fn total_monthly_cost(subscriptions: &[Subscription]) -> f64 {
    subscriptions
        .iter()
        .filter(|sub| sub.is_active)
        .fold(0.0, |acc, sub| {
            acc + monthly_equivalent(sub.amount, &sub.billing_cycle)
        })
}

/// アクティブなサブスクリプションの年額合計を計算する
///
/// # 引数
/// * `subscriptions` - サブスクリプションのリスト
///
/// # 戻り値
/// 年額換算の合計金額（常に月額合計の12倍）
pub fn total_yearly_cost(subscriptions: &[Subscription]) -> f64 {
    total_monthly_cost(subscriptions) * 12.0
}

/// 支出サマリーを計算する
///
/// # 引数
/// * `subscriptions` - サブスクリプションのリスト
///
/// # 戻り値
/// アクティブ件数と月額・年額合計をまとめたサマリー
pub fn spending_summary(subscriptions: &[Subscription]) -> SpendingSummary {
    let active_count = subscriptions.iter().filter(|sub| sub.is_active).count();
    let monthly_total = total_monthly_cost(subscriptions);

    SpendingSummary {
        active_count,
        monthly_total,
        yearly_total: monthly_total * 12.0,
    }
}

/// 金額を通貨表記でフォーマットする
///
/// # 引数
/// * `amount` - 金額
/// * `currency` - 通貨コード（Noneの場合はUSD）
///
/// # 戻り値
/// 通貨記号と3桁区切りを含む表示用文字列
///
/// # フォーマット規則
/// - USD/EUR/GBP: 記号 + 小数点以下2桁（例: "$1,234.56"）
/// - JPY: 記号 + 整数表示（例: "¥1,235"）
/// - 未知の通貨コード: コード + 空白 + 小数点以下2桁（例: "XYZ 100.00"）
/// - 端数は最小通貨単位で四捨五入する
pub fn format_currency(amount: f64, currency: Option<&str>) -> String {
    let code = currency.unwrap_or(DEFAULT_CURRENCY);
    let (symbol, decimals) = currency_style(code);

    // 非有限値はそのまま表示する（保存時のバリデーションで弾かれる前提）
    if !amount.is_finite() {
        return match symbol {
            Some(s) => format!("{s}{amount}"),
            None => format!("{code} {amount}"),
        };
    }

    let negative = amount < 0.0;
    let scale = 10_i128.pow(decimals);
    let minor_units = (amount.abs() * scale as f64).round() as i128;

    let integer_part = minor_units / scale;
    let fraction_part = minor_units % scale;

    let grouped = group_thousands(integer_part);
    let body = if decimals == 0 {
        grouped
    } else {
        format!(
            "{grouped}.{fraction_part:0width$}",
            width = decimals as usize
        )
    };

    let sign = if negative { "-" } else { "" };
    match symbol {
        Some(s) => format!("{sign}{s}{body}"),
        None => format!("{sign}{code} {body}"),
    }
}

/// 通貨コードに応じた記号と小数桁数を取得する
///
/// # 引数
/// * `code` - 通貨コード
///
/// # 戻り値
/// (通貨記号, 小数桁数)。未知のコードは記号なし・2桁
fn currency_style(code: &str) -> (Option<&'static str>, u32) {
    match code {
        "USD" => (Some("$"), 2),
        "EUR" => (Some("€"), 2),
        "GBP" => (Some("£"), 2),
        "JPY" => (Some("¥"), 0),
        _ => (None, 2),
    }
}

/// 整数部を3桁ごとにカンマで区切る
fn group_thousands(value: i128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    /// テスト用のサブスクリプションを作成するヘルパー
    fn make_subscription(amount: f64, billing_cycle: &str, is_active: bool) -> Subscription {
        Subscription {
            id: "test-id".to_string(),
            user_id: "test-user".to_string(),
            name: "テストサービス".to_string(),
            description: None,
            amount,
            currency: "USD".to_string(),
            billing_cycle: billing_cycle.to_string(),
            next_billing_date: "2024-01-01".to_string(),
            category: None,
            is_active,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_monthly_equivalent_weekly() {
        // 週次は4.33倍で月額換算される
        assert_eq!(monthly_equivalent(30.0, "weekly"), 30.0 * 4.33);
        assert!((monthly_equivalent(30.0, "weekly") - 129.9).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_equivalent_monthly() {
        assert_eq!(monthly_equivalent(10.0, "monthly"), 10.0);
        assert_eq!(monthly_equivalent(999.99, "monthly"), 999.99);
    }

    #[test]
    fn test_monthly_equivalent_quarterly() {
        assert_eq!(monthly_equivalent(30.0, "quarterly"), 10.0);
    }

    #[test]
    fn test_monthly_equivalent_yearly() {
        assert_eq!(monthly_equivalent(120.0, "yearly"), 10.0);
    }

    #[test]
    fn test_monthly_equivalent_unknown_cycle_is_zero() {
        // 未知の周期はエラーにせず0を返す
        assert_eq!(monthly_equivalent(50.0, "bogus-cycle"), 0.0);
        assert_eq!(monthly_equivalent(50.0, "annual"), 0.0);
        assert_eq!(monthly_equivalent(50.0, ""), 0.0);
        // 大文字小文字は区別される
        assert_eq!(monthly_equivalent(50.0, "Monthly"), 0.0);
    }

    #[test]
    fn test_monthly_equivalent_zero_amount() {
        assert_eq!(monthly_equivalent(0.0, "weekly"), 0.0);
        assert_eq!(monthly_equivalent(0.0, "monthly"), 0.0);
        assert_eq!(monthly_equivalent(0.0, "quarterly"), 0.0);
        assert_eq!(monthly_equivalent(0.0, "yearly"), 0.0);
    }

    #[test]
    fn test_monthly_equivalent_passes_negative_through() {
        // 負の金額は換算式をそのまま通す（入力検証は書き込み側の責務）
        assert_eq!(monthly_equivalent(-10.0, "monthly"), -10.0);
        assert_eq!(monthly_equivalent(-120.0, "yearly"), -10.0);
    }

    #[test]
    fn test_yearly_equivalent() {
        assert_eq!(yearly_equivalent(10.0, "monthly"), 120.0);
        assert_eq!(yearly_equivalent(120.0, "yearly"), 120.0);
        assert_eq!(yearly_equivalent(30.0, "quarterly"), 120.0);
        assert_eq!(yearly_equivalent(50.0, "bogus-cycle"), 0.0);
    }

    #[test]
    fn test_total_monthly_cost_filters_inactive() {
        let subscriptions = vec![
            make_subscription(120.0, "yearly", true),  // 月額換算10
            make_subscription(10.0, "monthly", true),  // 月額換算10
            make_subscription(100.0, "weekly", false), // 非アクティブは除外
        ];

        assert_eq!(total_monthly_cost(&subscriptions), 20.0);
    }

    #[test]
    fn test_total_monthly_cost_empty_list() {
        assert_eq!(total_monthly_cost(&[]), 0.0);
    }

    #[test]
    fn test_total_monthly_cost_all_inactive() {
        let subscriptions = vec![
            make_subscription(10.0, "monthly", false),
            make_subscription(120.0, "yearly", false),
        ];

        assert_eq!(total_monthly_cost(&subscriptions), 0.0);
    }

    #[test]
    fn test_total_monthly_cost_ignores_unknown_cycles() {
        // 未知の周期を持つ行が混ざっても合計は壊れない
        let subscriptions = vec![
            make_subscription(10.0, "monthly", true),
            make_subscription(9999.0, "biweekly", true),
        ];

        assert_eq!(total_monthly_cost(&subscriptions), 10.0);
    }

    #[test]
    fn test_total_monthly_cost_order_independent() {
        let a = make_subscription(120.0, "yearly", true);
        let b = make_subscription(10.0, "monthly", true);
        let c = make_subscription(30.0, "quarterly", true);

        let forward = total_monthly_cost(&[a.clone(), b.clone(), c.clone()]);
        let backward = total_monthly_cost(&[c, b, a]);

        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn test_total_yearly_cost_is_twelve_times_monthly() {
        let subscriptions = vec![
            make_subscription(10.0, "monthly", true),
            make_subscription(30.0, "weekly", true),
        ];

        assert_eq!(
            total_yearly_cost(&subscriptions),
            total_monthly_cost(&subscriptions) * 12.0
        );
    }

    #[test]
    fn test_monthly_total_mixed_cycles() {
        // 月額10 + 年額119 → 月額合計 19.9167付近
        let subscriptions = vec![
            make_subscription(10.0, "monthly", true),
            make_subscription(119.0, "yearly", true),
        ];

        let total = total_monthly_cost(&subscriptions);
        assert_eq!(total, 10.0 + 119.0 / 12.0);
        assert!((total - 19.9167).abs() < 1e-4);
    }

    #[test]
    fn test_spending_summary() {
        let subscriptions = vec![
            make_subscription(10.0, "monthly", true),
            make_subscription(120.0, "yearly", true),
            make_subscription(50.0, "monthly", false),
        ];

        let summary = spending_summary(&subscriptions);

        assert_eq!(summary.active_count, 2);
        assert_eq!(summary.monthly_total, 20.0);
        assert_eq!(summary.yearly_total, 240.0);
    }

    #[test]
    fn test_spending_summary_empty() {
        let summary = spending_summary(&[]);

        assert_eq!(summary.active_count, 0);
        assert_eq!(summary.monthly_total, 0.0);
        assert_eq!(summary.yearly_total, 0.0);
    }

    #[test]
    fn test_format_currency_usd_default() {
        // 通貨指定なしはUSD
        assert_eq!(format_currency(1234.56, None), "$1,234.56");
        assert_eq!(format_currency(1234.56, Some("USD")), "$1,234.56");
        assert_eq!(format_currency(0.0, None), "$0.00");
    }

    #[test]
    fn test_format_currency_rounds_to_minor_unit() {
        // 最小通貨単位で四捨五入される
        assert_eq!(format_currency(19.916666666666668, None), "$19.92");
        assert_eq!(format_currency(10.006, None), "$10.01");
        assert_eq!(format_currency(10.004, None), "$10.00");
    }

    #[test]
    fn test_format_currency_jpy_has_no_decimals() {
        assert_eq!(format_currency(1234.49, Some("JPY")), "¥1,234");
        assert_eq!(format_currency(1234.5, Some("JPY")), "¥1,235");
        assert_eq!(format_currency(980.0, Some("JPY")), "¥980");
    }

    #[test]
    fn test_format_currency_other_symbols() {
        assert_eq!(format_currency(1000.0, Some("EUR")), "€1,000.00");
        assert_eq!(format_currency(9.99, Some("GBP")), "£9.99");
    }

    #[test]
    fn test_format_currency_unknown_code() {
        // 未知の通貨コードはコードを前置する
        assert_eq!(format_currency(99.999, Some("XYZ")), "XYZ 100.00");
        assert_eq!(format_currency(1234.56, Some("CAD")), "CAD 1,234.56");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-42.5, Some("USD")), "-$42.50");
        assert_eq!(format_currency(-1234.56, None), "-$1,234.56");
    }

    #[test]
    fn test_format_currency_large_amount() {
        assert_eq!(format_currency(1234567.891, None), "$1,234,567.89");
        assert_eq!(format_currency(98765432.1, Some("JPY")), "¥98,765,432");
    }

    #[quickcheck]
    fn prop_yearly_is_always_twelve_times_monthly(amount: f64, cycle_index: u8) -> TestResult {
        if !amount.is_finite() {
            return TestResult::discard();
        }

        // 既知の周期に加えて未知の周期も混ぜる
        let cycles = ["weekly", "monthly", "quarterly", "yearly", "bogus-cycle"];
        let cycle = cycles[(cycle_index as usize) % cycles.len()];

        TestResult::from_bool(
            yearly_equivalent(amount, cycle) == monthly_equivalent(amount, cycle) * 12.0,
        )
    }

    #[quickcheck]
    fn prop_unknown_cycle_is_always_zero(amount: f64, cycle: String) -> TestResult {
        if !amount.is_finite() {
            return TestResult::discard();
        }
        if matches!(cycle.as_str(), "weekly" | "monthly" | "quarterly" | "yearly") {
            return TestResult::discard();
        }

        TestResult::from_bool(monthly_equivalent(amount, &cycle) == 0.0)
    }

    #[quickcheck]
    fn prop_total_is_sum_of_member_equivalents(amounts: Vec<u32>) -> bool {
        // 整数金額なら浮動小数点加算も正確なので厳密比較できる
        let cycles = ["weekly", "monthly", "quarterly", "yearly"];
        let subscriptions: Vec<Subscription> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                make_subscription(f64::from(*amount), cycles[i % cycles.len()], true)
            })
            .collect();

        let expected = subscriptions
            .iter()
            .fold(0.0, |acc, sub| {
                acc + monthly_equivalent(sub.amount, &sub.billing_cycle)
            });

        total_monthly_cost(&subscriptions) == expected
    }

    #[quickcheck]
    fn prop_inactive_subscriptions_never_contribute(amounts: Vec<u32>) -> bool {
        let subscriptions: Vec<Subscription> = amounts
            .iter()
            .map(|amount| make_subscription(f64::from(*amount), "monthly", false))
            .collect();

        total_monthly_cost(&subscriptions) == 0.0
    }
}
