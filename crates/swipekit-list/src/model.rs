#![forbid(unsafe_code)]

//! Transaction records rendered as list rows.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable identifier of a row (the transaction's id in the data API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether money left or entered the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
}

/// One financial transaction.
///
/// `amount` is a magnitude; the sign comes from `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RowId,
    pub category: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Calendar date the transaction is grouped under.
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    #[must_use]
    pub fn new(
        id: u64,
        category: impl Into<String>,
        amount: Decimal,
        kind: TransactionKind,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: RowId(id),
            category: category.into(),
            amount: amount.abs(),
            kind,
            note: None,
            date,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Amount with the sign implied by `kind` (expenses negative).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Expense => -self.amount,
            TransactionKind::Income => self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn amount_is_stored_as_magnitude() {
        let tx = Transaction::new(
            1,
            "Food",
            Decimal::new(-1250, 2),
            TransactionKind::Expense,
            day(4),
        );
        assert_eq!(tx.amount, Decimal::new(1250, 2));
        assert_eq!(tx.signed_amount(), Decimal::new(-1250, 2));
    }

    #[test]
    fn income_is_positive() {
        let tx = Transaction::new(
            2,
            "Salary",
            Decimal::new(300_000, 2),
            TransactionKind::Income,
            day(1),
        );
        assert_eq!(tx.signed_amount(), Decimal::new(300_000, 2));
    }

    #[test]
    fn deserializes_from_api_shape() {
        let json = r#"{
            "id": 7,
            "category": "Transport",
            "amount": "3.40",
            "kind": "expense",
            "date": "2026-03-02"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, RowId(7));
        assert_eq!(tx.kind, TransactionKind::Expense);
        assert_eq!(tx.amount, Decimal::new(340, 2));
        assert_eq!(tx.note, None);
        assert_eq!(tx.date, day(2));
    }

    #[test]
    fn row_id_displays_number() {
        assert_eq!(RowId(42).to_string(), "42");
    }
}
