//! Built-in financial query tools
//!
//! Every tool here is a read-only query against the shared
//! [`FinancialSnapshot`]. Argument problems are reported as `{"error": ...}`
//! values so a bad call never aborts sibling calls in the same round.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::registry::ToolRegistry;
use crate::snapshot::FinancialSnapshot;
use crate::tool::Tool;

/// Overall balance, income and expense summary
pub struct FinancialSummaryTool {
    snapshot: Arc<FinancialSnapshot>,
}

#[async_trait]
impl Tool for FinancialSummaryTool {
    fn name(&self) -> &str {
        "get_financial_summary"
    }

    fn description(&self) -> &str {
        "Get the user's overall financial summary: total balance across accounts, \
         income, expenses, and savings rate for the current period."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        let income = self.snapshot.total_income();
        let expenses = self.snapshot.total_expenses();
        let savings_rate = if income > 0.0 {
            (income - expenses) / income
        } else {
            0.0
        };
        Ok(json!({
            "total_balance": self.snapshot.total_balance(),
            "income": income,
            "expenses": expenses,
            "savings_rate": savings_rate,
            "account_count": self.snapshot.accounts.len(),
        }))
    }
}

/// Recent transactions, optionally filtered by category
pub struct ListTransactionsTool {
    snapshot: Arc<FinancialSnapshot>,
}

#[async_trait]
impl Tool for ListTransactionsTool {
    fn name(&self) -> &str {
        "list_transactions"
    }

    fn description(&self) -> &str {
        "List recent transactions, newest first. Optionally filter by spending \
         category and limit the number of results."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {"type": "number", "description": "Maximum number of transactions to return"},
                "category": {"type": "string", "description": "Only include this spending category"}
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let limit = match args.get("limit") {
            None => 20,
            Some(v) => match v.as_u64() {
                Some(n) if n > 0 => n as usize,
                _ => return Ok(json!({"error": "limit must be a positive number"})),
            },
        };
        let category = args.get("category").and_then(|c| c.as_str());

        let mut txns: Vec<_> = self
            .snapshot
            .transactions
            .iter()
            .filter(|t| category.is_none_or(|c| t.category.eq_ignore_ascii_case(c)))
            .collect();
        txns.sort_by(|a, b| b.date.cmp(&a.date));
        txns.truncate(limit);
        let count = txns.len();

        Ok(json!({
            "transactions": txns,
            "count": count,
        }))
    }
}

/// Spending totals per category
pub struct SpendingByCategoryTool {
    snapshot: Arc<FinancialSnapshot>,
}

#[async_trait]
impl Tool for SpendingByCategoryTool {
    fn name(&self) -> &str {
        "get_spending_by_category"
    }

    fn description(&self) -> &str {
        "Get total spending per category for the current period."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        let by_category = self.snapshot.spending_by_category();
        let categories: Vec<Value> = by_category
            .iter()
            .map(|(category, total)| json!({"category": category, "total": total}))
            .collect();
        Ok(json!({"categories": categories}))
    }
}

/// Budget limits versus spending
pub struct BudgetStatusTool {
    snapshot: Arc<FinancialSnapshot>,
}

#[async_trait]
impl Tool for BudgetStatusTool {
    fn name(&self) -> &str {
        "get_budget_status"
    }

    fn description(&self) -> &str {
        "Get each budget's limit, amount spent so far, and remaining headroom."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        let budgets: Vec<Value> = self
            .snapshot
            .budgets
            .iter()
            .map(|b| {
                json!({
                    "category": b.category,
                    "limit": b.limit,
                    "spent": b.spent,
                    "remaining": b.limit - b.spent,
                    "over_budget": b.spent > b.limit,
                })
            })
            .collect();
        Ok(json!({"budgets": budgets}))
    }
}

/// Crypto holdings and their market value
pub struct CryptoPortfolioTool {
    snapshot: Arc<FinancialSnapshot>,
}

#[async_trait]
impl Tool for CryptoPortfolioTool {
    fn name(&self) -> &str {
        "get_crypto_portfolio"
    }

    fn description(&self) -> &str {
        "Get the user's crypto holdings with current prices and total value."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        let holdings: Vec<Value> = self
            .snapshot
            .holdings
            .iter()
            .map(|h| {
                json!({
                    "symbol": h.symbol,
                    "name": h.name,
                    "quantity": h.quantity,
                    "price_usd": h.price_usd,
                    "value_usd": h.quantity * h.price_usd,
                })
            })
            .collect();
        Ok(json!({
            "holdings": holdings,
            "total_value_usd": self.snapshot.crypto_value(),
        }))
    }
}

/// Net worth over time
pub struct NetWorthHistoryTool {
    snapshot: Arc<FinancialSnapshot>,
}

#[async_trait]
impl Tool for NetWorthHistoryTool {
    fn name(&self) -> &str {
        "get_net_worth_history"
    }

    fn description(&self) -> &str {
        "Get the user's month-by-month net worth history."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        Ok(json!({"history": self.snapshot.net_worth_history}))
    }
}

/// Register all built-in tools against the given snapshot
pub fn register_builtin_tools(registry: &mut ToolRegistry, snapshot: Arc<FinancialSnapshot>) {
    registry.register(Arc::new(FinancialSummaryTool {
        snapshot: snapshot.clone(),
    }));
    registry.register(Arc::new(ListTransactionsTool {
        snapshot: snapshot.clone(),
    }));
    registry.register(Arc::new(SpendingByCategoryTool {
        snapshot: snapshot.clone(),
    }));
    registry.register(Arc::new(BudgetStatusTool {
        snapshot: snapshot.clone(),
    }));
    registry.register(Arc::new(CryptoPortfolioTool {
        snapshot: snapshot.clone(),
    }));
    registry.register(Arc::new(NetWorthHistoryTool { snapshot }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        let snapshot = Arc::new(FinancialSnapshot::sample());
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry, snapshot);
        registry
    }

    #[tokio::test]
    async fn test_summary_tool() {
        let registry = registry();
        let tool = registry.resolve("get_financial_summary").unwrap();
        let result = tool.execute(json!({})).await.unwrap();

        assert!(result["total_balance"].as_f64().unwrap() > 0.0);
        assert!(result["savings_rate"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_list_transactions_filters_and_limits() {
        let registry = registry();
        let tool = registry.resolve("list_transactions").unwrap();

        let result = tool
            .execute(json!({"category": "food", "limit": 1}))
            .await
            .unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["transactions"][0]["category"], "food");
    }

    #[tokio::test]
    async fn test_list_transactions_rejects_bad_limit() {
        let registry = registry();
        let tool = registry.resolve("list_transactions").unwrap();

        let result = tool.execute(json!({"limit": "ten"})).await.unwrap();
        assert!(result["error"].as_str().unwrap().contains("limit"));
    }

    #[tokio::test]
    async fn test_budget_status_flags_remaining() {
        let registry = registry();
        let tool = registry.resolve("get_budget_status").unwrap();
        let result = tool.execute(json!({})).await.unwrap();

        let budgets = result["budgets"].as_array().unwrap();
        assert!(!budgets.is_empty());
        for b in budgets {
            let limit = b["limit"].as_f64().unwrap();
            let spent = b["spent"].as_f64().unwrap();
            let remaining = b["remaining"].as_f64().unwrap();
            assert!((limit - spent - remaining).abs() < 1e-9);
        }
    }

    #[test]
    fn test_catalog_order_is_stable() {
        let registry = registry();
        let names: Vec<&str> = registry.describe().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_financial_summary",
                "list_transactions",
                "get_spending_by_category",
                "get_budget_status",
                "get_crypto_portfolio",
                "get_net_worth_history",
            ]
        );
    }
}
