//! Handler for `expense dashboard`: the summary totals plus two text bar charts.

use crate::api::Mode;
use crate::commands::{Client, Out};
use crate::model::{Amount, Analytics};
use crate::Result;
use std::fmt::Write;
use std::path::Path;

const BAR_WIDTH: usize = 40;
const BAR: char = '█';

/// Loads the analytics and renders them as text.
///
/// # Errors
/// - `ErrorType::Unauthenticated` if nobody is logged in.
/// - `ErrorType::AnalyticsLoadFailed` or `ErrorType::Timeout` if any of the three analytics
///   requests fails.
pub async fn dashboard(expense_home: &Path, mode: Mode) -> Result<Out<Analytics>> {
    let client = Client::connect(expense_home, mode).await?;
    let user = client.session.require_user()?;
    let analytics = client.view.load_analytics().await?;
    let message = format!("Dashboard for {}\n{}", user.name, render(&client, &analytics));
    Ok(Out::new(message, analytics))
}

fn render(client: &Client, analytics: &Analytics) -> String {
    let summary = &analytics.summary;
    let mut out = String::new();
    let _ = writeln!(out, "\nTotal income   {}", client.money(&summary.total_income));
    let _ = writeln!(out, "Total expense  {}", client.money(&summary.total_expense));
    let _ = writeln!(out, "Savings        {}", client.money(&summary.savings));

    let _ = writeln!(out, "\nSpending by category");
    if analytics.by_category.is_empty() {
        let _ = writeln!(out, "  (no expenses)");
    }
    let max = analytics
        .by_category
        .iter()
        .map(|c| c.total)
        .max()
        .unwrap_or(Amount::ZERO);
    let label_width = analytics
        .by_category
        .iter()
        .map(|c| c.category.chars().count())
        .max()
        .unwrap_or_default();
    for entry in &analytics.by_category {
        let _ = writeln!(
            out,
            "  {:<label_width$}  {:<BAR_WIDTH$}  {}",
            entry.category,
            bar(&entry.total, &max),
            client.money(&entry.total)
        );
    }

    let _ = writeln!(out, "\nMonthly trend");
    if analytics.monthly_trend.is_empty() {
        let _ = writeln!(out, "  (no transactions)");
    }
    let max = analytics
        .monthly_trend
        .iter()
        .flat_map(|m| [m.income, m.expense])
        .max()
        .unwrap_or(Amount::ZERO);
    for month in &analytics.monthly_trend {
        let _ = writeln!(
            out,
            "  {:<4} income   {:<BAR_WIDTH$}  {}",
            month.label(),
            bar(&month.income, &max),
            client.money(&month.income)
        );
        let _ = writeln!(
            out,
            "  {:<4} expense  {:<BAR_WIDTH$}  {}",
            "",
            bar(&month.expense, &max),
            client.money(&month.expense)
        );
    }
    out.truncate(out.trim_end().len());
    out
}

/// A bar whose length is `value` relative to `max`. Any non-zero value gets at least one block.
fn bar(value: &Amount, max: &Amount) -> String {
    if !value.is_positive() || !max.is_positive() {
        return String::new();
    }
    let ratio = value.to_f64() / max.to_f64();
    let len = ((ratio * BAR_WIDTH as f64).round() as usize).clamp(1, BAR_WIDTH);
    std::iter::repeat(BAR).take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DEMO_EMAIL, DEMO_PASSWORD};
    use crate::commands::login;
    use crate::error::ErrorType;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[test]
    fn test_bar() {
        let max = Amount::from_str("100").unwrap();
        assert_eq!(bar(&max, &max).chars().count(), BAR_WIDTH);
        assert_eq!(
            bar(&Amount::from_str("50").unwrap(), &max).chars().count(),
            BAR_WIDTH / 2
        );
        assert_eq!(bar(&Amount::from_str("0.01").unwrap(), &max).chars().count(), 1);
        assert_eq!(bar(&Amount::ZERO, &max), "");
        assert_eq!(bar(&max, &Amount::ZERO), "");
    }

    #[tokio::test]
    async fn test_dashboard() {
        let env = TestEnv::new().await;
        let home = env.config().root().to_path_buf();
        assert_eq!(
            dashboard(&home, Mode::Test).await.unwrap_err().kind(),
            ErrorType::Unauthenticated
        );

        login(&home, Mode::Test, DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .unwrap();
        let out = dashboard(&home, Mode::Test).await.unwrap();
        let message = out.message();
        assert!(message.contains("Total income   ₹107,500.00"));
        assert!(message.contains("Rent"));
        assert!(message.contains("M2"));
        assert_eq!(out.structure().unwrap().monthly_trend.len(), 2);
    }
}
