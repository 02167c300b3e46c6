//! Queries behind the login and dashboard pages and their rendering.

use chrono::Datelike;

use super::template::html_encode;
use crate::results::{ResultSet, Row};
use crate::types::{Param, SqlType, SqlValue};

pub const LOGIN_QUERY: &str =
    "SELECT UserName FROM dbo.SalesAgents WHERE UserName=@UserName AND PasswordText=@Password;";

/// Current-period metrics, then the agent's sales lines, newest first.
pub const DASHBOARD_BATCH: &str = "SELECT * FROM dbo.SalesDashboard WHERE UserName=@UserName AND SYSDATETIME() BETWEEN From_Date AND To_Date;\n\
SELECT s.[Timestamp], p.ProductName, s.Quantity, s.UnitPrice FROM dbo.Sales AS s INNER JOIN dbo.Products AS p ON s.ProductId=p.Id WHERE s.SalesAgentId=(SELECT Id FROM dbo.SalesAgents WHERE UserName=@UserName) ORDER BY [Timestamp] DESC;";

#[must_use]
pub fn login_params(username: &str, password: &str) -> Vec<Param> {
    vec![
        Param::new("UserName", SqlType::nvarchar(), username),
        Param::new("Password", SqlType::nvarchar(), password),
    ]
}

#[must_use]
pub fn dashboard_params(username: &str) -> Vec<Param> {
    vec![Param::new("UserName", SqlType::nvarchar(), username)]
}

/// User name of the first row of the login query, if any.
#[must_use]
pub fn authenticated_user(results: &[ResultSet]) -> Option<String> {
    results
        .first()?
        .first()?
        .get("UserName")?
        .as_text()
        .map(str::to_owned)
}

/// The agent's metrics for the current period.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesMetrics {
    pub year: i32,
    pub sales: f64,
    pub sales_prev_year: f64,
    pub target_amount: f64,
    pub discount_percent: f64,
}

impl SalesMetrics {
    /// Read the metrics row; `None` when the period start is missing.
    #[must_use]
    pub fn from_row(row: &Row) -> Option<Self> {
        let year = row.get("From_Date")?.as_date()?.year();
        Some(Self {
            year,
            sales: number(row, "Sales"),
            sales_prev_year: number(row, "Sales_prev_year"),
            target_amount: number(row, "TargetAmount"),
            discount_percent: number(row, "DiscountPercent"),
        })
    }

    /// `red` below 90% of target, ` green` at or above it, ` orange` in between.
    #[must_use]
    pub fn target_css(&self) -> &'static str {
        if self.sales < 0.9 * self.target_amount {
            "red"
        } else if self.sales >= self.target_amount {
            " green"
        } else {
            " orange"
        }
    }
}

/// One line of the sales detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub date: Option<chrono::NaiveDate>,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl SaleLine {
    #[must_use]
    pub fn from_row(row: &Row) -> Self {
        Self {
            date: row.get("Timestamp").and_then(SqlValue::as_date),
            product_name: row
                .get("ProductName")
                .and_then(SqlValue::as_text)
                .unwrap_or_default()
                .to_string(),
            quantity: number(row, "Quantity"),
            unit_price: number(row, "UnitPrice"),
        }
    }

    fn to_html(&self) -> String {
        let date = self
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        format!(
            "<tr><td>{date}</td><td>{}</td><td class=\"number\">{:.1}</td><td class=\"number\">{:.2}</td></tr>",
            html_encode(&self.product_name),
            self.quantity,
            self.unit_price
        )
    }
}

/// Template values for the dashboard page, or `None` when the batch did not
/// return a metrics row.
#[must_use]
pub fn dashboard_values(results: &[ResultSet]) -> Option<Vec<(&'static str, String)>> {
    let metrics = SalesMetrics::from_row(results.first()?.first()?)?;
    let details: String = results
        .get(1)
        .map(|set| {
            set.iter()
                .map(|row| SaleLine::from_row(row).to_html())
                .collect()
        })
        .unwrap_or_default();

    Some(vec![
        ("Year", metrics.year.to_string()),
        ("PrevYear", (metrics.year - 1).to_string()),
        ("Sales", format!("{:.2}", metrics.sales)),
        ("PrevSales", format!("{:.2}", metrics.sales_prev_year)),
        ("SalesTarget", format!("{:.2}", metrics.target_amount)),
        ("Discount", format!("{:.2}%", metrics.discount_percent)),
        ("SalesTargetCss", metrics.target_css().to_string()),
        ("SalesDetails", details),
    ])
}

fn number(row: &Row, column: &str) -> f64 {
    row.get(column).and_then(SqlValue::as_f64).unwrap_or(0.0)
}
