//! Expense tracking endpoints

use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{serde_ext, ApiClient};
use crate::error::{ApiError, Result};

/// Categories offered by the expense form
pub const CATEGORIES: &[&str] = &[
    "Groceries",
    "Utilities",
    "Entertainment",
    "Transport",
    "Dining",
    "Shopping",
    "Healthcare",
    "Education",
    "Travel",
    "Personal Care",
    "Gifts",
    "Savings",
    "Investments",
    "Other",
];

/// Recorded expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "serde_ext::lenient_f64")]
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub occurred_on: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
}

/// Expense to record
#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
}

impl NewExpense {
    /// Validate and normalise before sending
    ///
    /// Empty optional strings become `null`; the recurrence pattern is only
    /// kept for recurring expenses.
    pub fn normalized(mut self) -> Result<Self> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("title is required".into()));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ApiError::Validation("amount must be a positive number".into()));
        }

        self.subcategory = self.subcategory.filter(|s| !s.trim().is_empty());
        self.description = self.description.filter(|s| !s.trim().is_empty());
        if !self.is_recurring {
            self.recurrence_pattern = None;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryAmount {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub amount: f64,
    #[serde(default)]
    pub percentage: Option<f64>,
}

/// Spending statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseStats {
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub this_month_total: f64,
    #[serde(default)]
    pub month_change_percent: Option<f64>,
    #[serde(default)]
    pub budget_amount: Option<f64>,
    #[serde(default)]
    pub budget_percentage: Option<f64>,
    #[serde(default)]
    pub top_category: Option<CategoryAmount>,
    #[serde(default)]
    pub total_transactions: i64,
    #[serde(default)]
    pub category_breakdown: Vec<CategoryAmount>,
    #[serde(default)]
    pub monthly_trend: Vec<CategoryAmount>,
}

#[derive(Serialize)]
struct BudgetBody {
    amount: f64,
}

/// Expense endpoints
pub struct ExpensesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ExpensesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<ExpenseStats> {
        self.client.get("/api/expenses/stats", "Failed to fetch expense stats").await
    }

    pub async fn recent(&self) -> Result<Vec<Expense>> {
        self.client
            .get("/api/expenses/recent", "Failed to fetch recent transactions")
            .await
    }

    pub async fn create(&self, expense: NewExpense) -> Result<Expense> {
        let expense = expense.normalized()?;
        self.client
            .send(Method::POST, "/api/expenses", &expense, "Failed to create expense")
            .await
    }

    /// Set the monthly budget
    pub async fn set_budget(&self, amount: f64) -> Result<serde_json::Value> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ApiError::Validation("budget must be zero or more".into()));
        }
        self.client
            .send(Method::POST, "/api/expenses/budget", &BudgetBody { amount }, "Failed to set budget")
            .await
    }
}
