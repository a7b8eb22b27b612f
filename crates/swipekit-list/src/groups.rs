#![forbid(unsafe_code)]

//! Date groups: rows bucketed by calendar date with running totals.
//!
//! A group whose last row is deleted does not vanish at once. It collapses
//! with a tween the caller anchors to the exit of its last leaving row, so
//! that row and its group header leave the screen together, and is dropped
//! only once that tween has finished.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use web_time::Instant;

use swipekit_core::Tween;

use crate::model::{RowId, Transaction, TransactionKind};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Collapse {
    tween: Tween,
    finished: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    date: NaiveDate,
    rows: Vec<RowId>,
    expense_total: Decimal,
    income_total: Decimal,
    collapse: Option<Collapse>,
}

impl DateGroup {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            rows: Vec::new(),
            expense_total: Decimal::ZERO,
            income_total: Decimal::ZERO,
            collapse: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Member rows in display order.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn expense_total(&self) -> Decimal {
        self.expense_total
    }

    #[inline]
    #[must_use]
    pub fn income_total(&self) -> Decimal {
        self.income_total
    }

    /// Income minus expenses.
    #[must_use]
    pub fn net_total(&self) -> Decimal {
        self.income_total - self.expense_total
    }

    /// The collapse tween, once the group has emptied.
    #[must_use]
    pub fn collapse(&self) -> Option<&Tween> {
        self.collapse.as_ref().map(|c| &c.tween)
    }

    #[must_use]
    pub fn is_collapsing(&self) -> bool {
        self.collapse.is_some()
    }

    /// Header opacity/height factor at `now`, 1.0 when not collapsing.
    #[must_use]
    pub fn visibility_at(&self, now: Instant) -> f64 {
        match &self.collapse {
            Some(c) if c.finished => 0.0,
            Some(c) => c.tween.value_at(now).clamp(0.0, 1.0),
            None => 1.0,
        }
    }

    fn is_done_at(&self, now: Instant) -> bool {
        self.collapse
            .is_some_and(|c| c.finished || c.tween.is_complete_at(now))
    }

    fn add(&mut self, tx: &Transaction) {
        self.rows.push(tx.id);
        match tx.kind {
            TransactionKind::Expense => self.expense_total += tx.amount,
            TransactionKind::Income => self.income_total += tx.amount,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateGroups {
    groups: BTreeMap<NaiveDate, DateGroup>,
}

impl DateGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all groups from rows already in display order.
    pub fn rebuild<'a>(&mut self, transactions: impl IntoIterator<Item = &'a Transaction>) {
        self.groups.clear();
        for tx in transactions {
            self.insert(tx);
        }
    }

    pub fn insert(&mut self, tx: &Transaction) {
        self.groups
            .entry(tx.date)
            .or_insert_with(|| DateGroup::new(tx.date))
            .add(tx);
    }

    /// Remove a deleted row from its group and its totals.
    ///
    /// Returns the number of rows left in the group, or `None` if the row
    /// was not a member.
    pub fn revoke(&mut self, tx: &Transaction) -> Option<usize> {
        let group = self.groups.get_mut(&tx.date)?;
        let index = group.rows.iter().position(|id| *id == tx.id)?;
        group.rows.remove(index);
        match tx.kind {
            TransactionKind::Expense => group.expense_total -= tx.amount,
            TransactionKind::Income => group.income_total -= tx.amount,
        }
        Some(group.rows.len())
    }

    /// Start collapsing an emptied group. Returns `false` if the group is
    /// unknown, still has rows, or is already collapsing.
    pub fn begin_collapse(&mut self, date: NaiveDate, tween: Tween) -> bool {
        match self.groups.get_mut(&date) {
            Some(group) if group.rows.is_empty() && group.collapse.is_none() => {
                group.collapse = Some(Collapse {
                    tween,
                    finished: false,
                });
                true
            }
            _ => false,
        }
    }

    /// Drop an emptied group at once, without a collapse. Returns `false` if
    /// the group is unknown or still has rows.
    pub fn drop_empty(&mut self, date: NaiveDate) -> bool {
        if self.groups.get(&date).is_some_and(DateGroup::is_empty) {
            self.groups.remove(&date);
            true
        } else {
            false
        }
    }

    /// Mark a collapse as finished ahead of the clock (animation-end callback).
    pub fn finish_collapse(&mut self, date: NaiveDate) -> bool {
        match self.groups.get_mut(&date).and_then(|g| g.collapse.as_mut()) {
            Some(collapse) if !collapse.finished => {
                collapse.finished = true;
                true
            }
            _ => false,
        }
    }

    /// Drop groups whose collapse has completed at `now`.
    pub fn drop_collapsed(&mut self, now: Instant) -> Vec<NaiveDate> {
        let done: Vec<NaiveDate> = self
            .groups
            .values()
            .filter(|g| g.is_done_at(now))
            .map(|g| g.date)
            .collect();
        for date in &done {
            self.groups.remove(date);
        }
        done
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&DateGroup> {
        self.groups.get(&date)
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.groups.contains_key(&date)
    }

    /// Rendered groups, newest date first.
    pub fn iter(&self) -> impl Iterator<Item = &DateGroup> {
        self.groups
            .values()
            .rev()
            .filter(|g| !g.rows.is_empty() || g.collapse.is_some())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}
