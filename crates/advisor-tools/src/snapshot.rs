//! In-memory financial data context
//!
//! The snapshot is the shared, read-mostly dataset every tool queries within
//! a round. Concurrently executing tools hold it behind an `Arc` and never
//! mutate it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Investment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    pub balance: f64,
}

/// A single transaction; negative amounts are spending, positive are income
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub limit: f64,
    pub spent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoHolding {
    pub symbol: String,
    pub name: String,
    pub quantity: f64,
    pub price_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetWorthPoint {
    pub month: String,
    pub value: f64,
}

/// The full financial data context backing the built-in tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub holdings: Vec<CryptoHolding>,
    pub net_worth_history: Vec<NetWorthPoint>,
}

impl FinancialSnapshot {
    /// Deterministic sample dataset used by the demo surfaces and tests
    pub fn sample() -> Self {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

        Self {
            accounts: vec![
                Account {
                    id: "acc-1".into(),
                    name: "Everyday Checking".into(),
                    kind: AccountKind::Checking,
                    balance: 4_250.32,
                },
                Account {
                    id: "acc-2".into(),
                    name: "Rainy Day Savings".into(),
                    kind: AccountKind::Savings,
                    balance: 18_400.00,
                },
                Account {
                    id: "acc-3".into(),
                    name: "Travel Credit Card".into(),
                    kind: AccountKind::Credit,
                    balance: -1_120.45,
                },
                Account {
                    id: "acc-4".into(),
                    name: "Index Portfolio".into(),
                    kind: AccountKind::Investment,
                    balance: 32_780.90,
                },
            ],
            transactions: vec![
                Transaction {
                    id: "txn-1".into(),
                    date: d(2026, 8, 1),
                    description: "Monthly salary".into(),
                    category: "income".into(),
                    amount: 6_200.00,
                },
                Transaction {
                    id: "txn-2".into(),
                    date: d(2026, 8, 2),
                    description: "Rent".into(),
                    category: "housing".into(),
                    amount: -1_850.00,
                },
                Transaction {
                    id: "txn-3".into(),
                    date: d(2026, 8, 5),
                    description: "Grocery run".into(),
                    category: "food".into(),
                    amount: -214.38,
                },
                Transaction {
                    id: "txn-4".into(),
                    date: d(2026, 8, 9),
                    description: "Electric bill".into(),
                    category: "utilities".into(),
                    amount: -96.20,
                },
                Transaction {
                    id: "txn-5".into(),
                    date: d(2026, 8, 12),
                    description: "Dinner out".into(),
                    category: "food".into(),
                    amount: -82.50,
                },
                Transaction {
                    id: "txn-6".into(),
                    date: d(2026, 8, 15),
                    description: "Gym membership".into(),
                    category: "health".into(),
                    amount: -45.00,
                },
                Transaction {
                    id: "txn-7".into(),
                    date: d(2026, 8, 18),
                    description: "Freelance invoice".into(),
                    category: "income".into(),
                    amount: 850.00,
                },
                Transaction {
                    id: "txn-8".into(),
                    date: d(2026, 8, 21),
                    description: "Streaming services".into(),
                    category: "entertainment".into(),
                    amount: -38.97,
                },
            ],
            budgets: vec![
                Budget {
                    category: "food".into(),
                    limit: 600.0,
                    spent: 296.88,
                },
                Budget {
                    category: "entertainment".into(),
                    limit: 150.0,
                    spent: 38.97,
                },
                Budget {
                    category: "utilities".into(),
                    limit: 200.0,
                    spent: 96.20,
                },
                Budget {
                    category: "housing".into(),
                    limit: 1_900.0,
                    spent: 1_850.0,
                },
            ],
            holdings: vec![
                CryptoHolding {
                    symbol: "BTC".into(),
                    name: "Bitcoin".into(),
                    quantity: 0.42,
                    price_usd: 64_300.0,
                },
                CryptoHolding {
                    symbol: "ETH".into(),
                    name: "Ethereum".into(),
                    quantity: 3.1,
                    price_usd: 3_120.0,
                },
                CryptoHolding {
                    symbol: "SOL".into(),
                    name: "Solana".into(),
                    quantity: 28.0,
                    price_usd: 148.5,
                },
            ],
            net_worth_history: vec![
                NetWorthPoint {
                    month: "2026-03".into(),
                    value: 78_900.0,
                },
                NetWorthPoint {
                    month: "2026-04".into(),
                    value: 80_150.0,
                },
                NetWorthPoint {
                    month: "2026-05".into(),
                    value: 81_020.0,
                },
                NetWorthPoint {
                    month: "2026-06".into(),
                    value: 83_400.0,
                },
                NetWorthPoint {
                    month: "2026-07".into(),
                    value: 84_310.0,
                },
                NetWorthPoint {
                    month: "2026-08".into(),
                    value: 86_930.0,
                },
            ],
        }
    }

    /// Sum of all account balances
    pub fn total_balance(&self) -> f64 {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    /// Total income over the transaction window (positive amounts)
    pub fn total_income(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.amount > 0.0)
            .map(|t| t.amount)
            .sum()
    }

    /// Total spending over the transaction window, as a positive figure
    pub fn total_expenses(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.amount < 0.0)
            .map(|t| -t.amount)
            .sum()
    }

    /// Spending per category, as positive figures, sorted by category name
    pub fn spending_by_category(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for t in self.transactions.iter().filter(|t| t.amount < 0.0) {
            *totals.entry(t.category.clone()).or_insert(0.0) += -t.amount;
        }
        totals
    }

    /// Total market value of crypto holdings
    pub fn crypto_value(&self) -> f64 {
        self.holdings.iter().map(|h| h.quantity * h.price_usd).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_consistent() {
        let snapshot = FinancialSnapshot::sample();
        assert!(!snapshot.accounts.is_empty());
        assert!(snapshot.total_income() > snapshot.total_expenses());
        assert!(snapshot.total_balance() > 0.0);
    }

    #[test]
    fn test_spending_by_category_aggregates() {
        let snapshot = FinancialSnapshot::sample();
        let by_category = snapshot.spending_by_category();
        // Two food transactions in the sample set
        assert!((by_category["food"] - 296.88).abs() < 1e-9);
        // Income is not spending
        assert!(!by_category.contains_key("income"));
    }

    #[test]
    fn test_crypto_value() {
        let snapshot = FinancialSnapshot::sample();
        let expected = 0.42 * 64_300.0 + 3.1 * 3_120.0 + 28.0 * 148.5;
        assert!((snapshot.crypto_value() - expected).abs() < 1e-6);
    }
}
