//! End-to-end delete pipeline: prompt, optimistic exit, remote reconciliation
//! and the date-group cascade.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::executor::block_on;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use swipekit_list::{
    DeleteCompletion, DeleteRequest, DeleteResolution, DeletedRow, ListEvent, Point,
    PromptResolution, RemoteError, RowId, RowPhase, RowRemote, ScrollFlag, SwipeConfig,
    SwipeError, SwipeList, TouchOutcome, TouchTarget, Transaction, TransactionKind,
    dispatch_delete,
};
use web_time::{Duration, Instant};

const MS: Duration = Duration::from_millis(1);

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
}

fn transactions() -> Vec<Transaction> {
    vec![
        Transaction::new(1, "Coffee", Decimal::new(350, 2), TransactionKind::Expense, day(10)),
        Transaction::new(2, "Refund", Decimal::new(1200, 2), TransactionKind::Income, day(10)),
        Transaction::new(3, "Rent", Decimal::new(90_000, 2), TransactionKind::Expense, day(9))
            .with_note("August"),
    ]
}

struct Harness {
    list: SwipeList,
    events: Rc<RefCell<Vec<ListEvent>>>,
    scroll: ScrollFlag,
}

impl Harness {
    fn new(config: SwipeConfig) -> Self {
        let mut list = SwipeList::new(config).unwrap();
        list.refresh(transactions());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        list.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        let scroll = ScrollFlag::new();
        list.attach_scroll_container(Box::new(scroll.clone()));
        Self {
            list,
            events,
            scroll,
        }
    }

    /// Reveal `id`, tap its delete action and confirm once the guard passed.
    fn confirm(&mut self, id: RowId, t0: Instant) -> (DeleteRequest, Instant) {
        let list = &mut self.list;
        list.touch_start(id, Point::new(300.0, 20.0), TouchTarget::Body, t0)
            .unwrap();
        list.touch_move(id, Point::new(260.0, 21.0), t0 + 30 * MS).unwrap();
        list.touch_move(id, Point::new(220.0, 22.0), t0 + 120 * MS).unwrap();
        let snapped = list
            .touch_end(id, Point::new(220.0, 22.0), t0 + 120 * MS)
            .unwrap();
        assert!(matches!(snapped, TouchOutcome::Snapped { .. }));

        let t1 = t0 + 500 * MS;
        list.touch_start(id, Point::new(350.0, 20.0), TouchTarget::DeleteAction, t1)
            .unwrap();
        let shown = list
            .touch_end(id, Point::new(350.0, 20.0), t1 + 60 * MS)
            .unwrap();
        assert_eq!(shown, TouchOutcome::PromptShown(id));

        let t2 = t1 + 600 * MS;
        match list.confirm_delete(t2).unwrap() {
            PromptResolution::Confirmed(request) => (request, t2),
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    fn count(&self, pred: impl Fn(&ListEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

#[test]
fn failed_delete_rolls_back_to_open() {
    let mut h = Harness::new(SwipeConfig::default());
    let (request, t) = h.confirm(RowId(1), Instant::now());
    assert!(h.scroll.is_scroll_enabled());

    let resolution = h
        .list
        .complete_delete(
            DeleteCompletion::failed(request.ticket, RemoteError::new("HTTP 500")),
            t + 150 * MS,
        )
        .unwrap();
    assert_eq!(
        resolution,
        DeleteResolution::RolledBack {
            row: RowId(1),
            error: RemoteError::new("HTTP 500"),
        }
    );

    let state = h.list.interaction(RowId(1), t + 150 * MS).unwrap();
    assert_eq!(state.phase, RowPhase::Open);
    assert_eq!(state.offset_x, -h.list.config().drag.delete_threshold);
    assert!(h.list.contains(RowId(1)));
    assert_eq!(h.list.group(day(10)).unwrap().rows().len(), 2);
    assert!(!h.scroll.is_scroll_enabled());

    assert_eq!(h.count(|e| matches!(e, ListEvent::DeleteFailed { .. })), 1);
    assert_eq!(h.count(|e| matches!(e, ListEvent::RowDeleted(_))), 0);

    // The exit reverses over the time it had already run.
    let restore = h.list.row_exit(RowId(1)).unwrap();
    assert_eq!(restore.duration(), 150 * MS);
    h.list.tick(t + 300 * MS);
    assert!(h.list.row_exit(RowId(1)).is_none());
    assert!(h.list.tick(t + Duration::from_secs(2)).is_empty());
}

#[test]
fn retry_after_failure_can_succeed() {
    let mut h = Harness::new(SwipeConfig::default());
    let (request, t) = h.confirm(RowId(2), Instant::now());
    h.list
        .complete_delete(
            DeleteCompletion::failed(request.ticket, RemoteError::new("offline")),
            t,
        )
        .unwrap();

    let t1 = t + 100 * MS;
    let shown = {
        h.list
            .touch_start(RowId(2), Point::new(350.0, 20.0), TouchTarget::DeleteAction, t1)
            .unwrap();
        h.list
            .touch_end(RowId(2), Point::new(350.0, 20.0), t1 + 40 * MS)
            .unwrap()
    };
    assert_eq!(shown, TouchOutcome::PromptShown(RowId(2)));
    let t2 = t1 + Duration::from_secs(1);
    let PromptResolution::Confirmed(retry) = h.list.confirm_delete(t2).unwrap() else {
        panic!("expected confirmation");
    };
    assert_ne!(retry.ticket, request.ticket);
    h.list
        .complete_delete(DeleteCompletion::succeeded(retry.ticket), t2)
        .unwrap();
    let report = h.list.tick(t2 + 250 * MS);
    assert_eq!(report.removed_rows, vec![RowId(2)]);
    assert_eq!(h.count(|e| matches!(e, ListEvent::RowDeleted(_))), 1);
}

#[test]
fn deleting_last_row_collapses_group_in_sync() {
    let mut h = Harness::new(SwipeConfig::default());
    let (request, t) = h.confirm(RowId(3), Instant::now());

    let resolution = h
        .list
        .complete_delete(DeleteCompletion::succeeded(request.ticket), t + 40 * MS)
        .unwrap();
    let row_exit = h.list.row_exit(RowId(3)).unwrap();
    let group_exit = *h.list.group(day(9)).unwrap().collapse().unwrap();
    assert_eq!(row_exit.duration(), Duration::from_millis(250));
    assert_eq!(group_exit.duration(), row_exit.duration());
    assert_eq!(group_exit.ends_at(), row_exit.ends_at());
    assert_eq!(
        resolution,
        DeleteResolution::Deleted {
            row: RowId(3),
            removes_at: row_exit.ends_at(),
            group_collapsed: Some(day(9)),
        }
    );

    for ms in [50, 120, 200, 249] {
        let report = h.list.tick(t + ms * MS);
        assert!(report.is_empty(), "removed early at {ms}ms");
        assert!(h.list.group(day(9)).is_some());
    }
    let report = h.list.tick(t + 250 * MS);
    assert_eq!(report.removed_rows, vec![RowId(3)]);
    assert_eq!(report.removed_groups, vec![day(9)]);
    assert!(h.list.group(day(9)).is_none());

    let events = h.events.borrow();
    let deleted: Vec<&ListEvent> = events
        .iter()
        .filter(|e| matches!(e, ListEvent::RowDeleted(_)))
        .collect();
    assert_eq!(
        deleted,
        vec![&ListEvent::RowDeleted(DeletedRow {
            id: RowId(3),
            kind: TransactionKind::Expense,
            amount: Decimal::new(90_000, 2),
            date: day(9),
            category: "Rent".to_string(),
        })]
    );
    assert!(events.contains(&ListEvent::GroupEmptied {
        date: day(9),
        collapse: Duration::from_millis(250),
    }));
    assert!(events.contains(&ListEvent::GroupRemoved(day(9))));
}

#[test]
fn late_success_removes_row_and_group_together() {
    let mut h = Harness::new(SwipeConfig::default());
    let (request, t) = h.confirm(RowId(3), Instant::now());
    assert!(h.list.tick(t + 400 * MS).is_empty());
    assert!(h.list.contains(RowId(3)));

    h.list
        .complete_delete(DeleteCompletion::succeeded(request.ticket), t + 900 * MS)
        .unwrap();
    let report = h.list.tick(t + 900 * MS);
    assert_eq!(report.removed_rows, vec![RowId(3)]);
    assert_eq!(report.removed_groups, vec![day(9)]);
}

#[test]
fn out_of_order_successes_keep_group_until_last_exit() {
    let mut h = Harness::new(SwipeConfig::default());
    let (first, t1) = h.confirm(RowId(1), Instant::now());
    let (second, c2) = h.confirm(RowId(2), t1 + 900 * MS);
    assert_eq!(c2, t1 + Duration::from_secs(2));

    h.list
        .complete_delete(DeleteCompletion::succeeded(second.ticket), c2 + 10 * MS)
        .unwrap();
    assert!(!h.list.group(day(10)).unwrap().is_collapsing());
    let resolution = h
        .list
        .complete_delete(DeleteCompletion::succeeded(first.ticket), c2 + 50 * MS)
        .unwrap();
    assert!(matches!(
        resolution,
        DeleteResolution::Deleted {
            row: RowId(1),
            group_collapsed: Some(_),
            ..
        }
    ));

    let second_exit = h.list.row_exit(RowId(2)).unwrap();
    let collapse = *h.list.group(day(10)).unwrap().collapse().unwrap();
    assert_eq!(collapse.ends_at(), second_exit.ends_at());
    assert_eq!(collapse.ends_at(), c2 + 250 * MS);

    let report = h.list.tick(c2 + 60 * MS);
    assert_eq!(report.removed_rows, vec![RowId(1)]);
    assert!(report.removed_groups.is_empty());
    let rendered = h.list.rows_in_group(day(10), c2 + 60 * MS);
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].visibility > 0.0);
    assert!(h.list.group(day(10)).is_some());

    assert!(h.list.tick(c2 + 249 * MS).is_empty());
    let report = h.list.tick(c2 + 250 * MS);
    assert_eq!(report.removed_rows, vec![RowId(2)]);
    assert_eq!(report.removed_groups, vec![day(10)]);
    assert_eq!(
        h.count(|e| matches!(e, ListEvent::GroupEmptied { date, .. } if *date == day(10))),
        1
    );
}

#[test]
fn unmounting_last_row_drops_its_group() {
    let mut h = Harness::new(SwipeConfig::default());
    assert!(h.list.unmount_row(RowId(3), Instant::now()));
    assert!(h.list.group(day(9)).is_none());
    assert_eq!(h.list.groups().count(), 1);
    assert_eq!(h.count(|e| *e == ListEvent::GroupRemoved(day(9))), 1);
    assert_eq!(h.count(|e| matches!(e, ListEvent::GroupEmptied { .. })), 0);
    assert!(h.list.tick(Instant::now()).is_empty());
}

#[test]
fn unmount_emptying_group_follows_exiting_row() {
    let mut h = Harness::new(SwipeConfig::default());
    let (request, t) = h.confirm(RowId(1), Instant::now());
    h.list
        .complete_delete(DeleteCompletion::succeeded(request.ticket), t + 10 * MS)
        .unwrap();
    assert!(h.list.unmount_row(RowId(2), t + 20 * MS));

    let exit = h.list.row_exit(RowId(1)).unwrap();
    let collapse = *h.list.group(day(10)).unwrap().collapse().unwrap();
    assert_eq!(collapse.ends_at(), exit.ends_at());
    assert!(h.list.tick(t + 200 * MS).is_empty());

    let report = h.list.tick(t + 250 * MS);
    assert_eq!(report.removed_rows, vec![RowId(1)]);
    assert_eq!(report.removed_groups, vec![day(10)]);
}

#[test]
fn group_with_survivors_keeps_totals_current() {
    let mut h = Harness::new(SwipeConfig::default());
    let before = h.list.group(day(10)).unwrap().net_total();
    assert_eq!(before, Decimal::new(850, 2));

    let (request, t) = h.confirm(RowId(1), Instant::now());
    h.list
        .complete_delete(DeleteCompletion::succeeded(request.ticket), t)
        .unwrap();
    let group = h.list.group(day(10)).unwrap();
    assert!(!group.is_collapsing());
    assert_eq!(group.expense_total(), Decimal::ZERO);
    assert_eq!(group.net_total(), Decimal::new(1200, 2));
}

#[test]
fn reduced_motion_removes_on_completion_tick() {
    let mut h = Harness::new(SwipeConfig::reduced_motion());
    let (request, t) = h.confirm(RowId(3), Instant::now());
    assert_eq!(h.list.row_exit(RowId(3)).unwrap().duration(), Duration::ZERO);

    h.list
        .complete_delete(DeleteCompletion::succeeded(request.ticket), t)
        .unwrap();
    assert_eq!(
        h.list.group(day(9)).unwrap().collapse().unwrap().duration(),
        Duration::ZERO
    );
    let report = h.list.tick(t);
    assert_eq!(report.removed_rows, vec![RowId(3)]);
    assert_eq!(report.removed_groups, vec![day(9)]);
}

#[test]
fn unmount_while_deleting_drops_ticket() {
    let mut h = Harness::new(SwipeConfig::default());
    let (request, t) = h.confirm(RowId(1), Instant::now());
    assert_eq!(
        h.list.interaction(RowId(1), t).unwrap().phase,
        RowPhase::Deleting
    );

    assert!(h.list.unmount_row(RowId(1), t));
    assert_eq!(h.list.active_row(), None);
    assert!(h.scroll.is_scroll_enabled());
    assert!(h.list.pending_deletes().is_empty());
    let err = h
        .list
        .complete_delete(DeleteCompletion::succeeded(request.ticket), t)
        .unwrap_err();
    assert!(matches!(err, SwipeError::StaleTicket(_)));
}

#[test]
fn rollback_dismisses_prompt_of_other_row() {
    let mut h = Harness::new(SwipeConfig::default());
    let (request, t) = h.confirm(RowId(1), Instant::now());

    let t1 = t + 10 * MS;
    let list = &mut h.list;
    list.touch_start(RowId(3), Point::new(300.0, 20.0), TouchTarget::Body, t1)
        .unwrap();
    list.touch_move(RowId(3), Point::new(250.0, 20.0), t1 + 30 * MS).unwrap();
    list.touch_move(RowId(3), Point::new(210.0, 20.0), t1 + 120 * MS).unwrap();
    list.touch_end(RowId(3), Point::new(210.0, 20.0), t1 + 120 * MS).unwrap();
    list.touch_start(RowId(3), Point::new(350.0, 20.0), TouchTarget::DeleteAction, t1 + 400 * MS)
        .unwrap();
    list.touch_end(RowId(3), Point::new(350.0, 20.0), t1 + 450 * MS).unwrap();
    assert_eq!(list.prompt().map(|p| p.row), Some(RowId(3)));

    list.complete_delete(
        DeleteCompletion::failed(request.ticket, RemoteError::new("timeout")),
        t1 + 500 * MS,
    )
    .unwrap();
    assert!(list.prompt().is_none());
    assert_eq!(list.active_row(), Some(RowId(1)));
    let other = list.interaction(RowId(3), t1 + 500 * MS).unwrap();
    assert_eq!(other.phase, RowPhase::Idle);
}

// ── Remote seam ─────────────────────────────────────────────────────────

struct FakeApi {
    fail_on: Option<RowId>,
    calls: RefCell<Vec<RowId>>,
}

#[async_trait(?Send)]
impl RowRemote for FakeApi {
    async fn delete_row(&self, id: RowId) -> Result<(), RemoteError> {
        self.calls.borrow_mut().push(id);
        if self.fail_on == Some(id) {
            Err(RemoteError::new("row is locked"))
        } else {
            Ok(())
        }
    }
}

#[test]
fn dispatch_feeds_completion_back() {
    let api = FakeApi {
        fail_on: Some(RowId(2)),
        calls: RefCell::new(Vec::new()),
    };
    let mut h = Harness::new(SwipeConfig::default());

    let (first, t) = h.confirm(RowId(1), Instant::now());
    let completion = block_on(dispatch_delete(&api, first));
    let resolution = h.list.complete_delete(completion, t + 20 * MS).unwrap();
    assert!(matches!(resolution, DeleteResolution::Deleted { row: RowId(1), .. }));

    let (second, t) = h.confirm(RowId(2), t + 100 * MS);
    let completion = block_on(dispatch_delete(&api, second));
    let resolution = h.list.complete_delete(completion, t + 20 * MS).unwrap();
    assert!(matches!(resolution, DeleteResolution::RolledBack { row: RowId(2), .. }));

    assert_eq!(*api.calls.borrow(), vec![RowId(1), RowId(2)]);
    assert_eq!(h.count(|e| matches!(e, ListEvent::RowDeleted(_))), 1);
    assert_eq!(h.count(|e| matches!(e, ListEvent::DeleteFailed { .. })), 1);
}

#[test]
fn list_from_toml_config() {
    let config = SwipeConfig::from_toml_str(
        r#"
        [drag]
        delete_threshold = 96.0

        [delete]
        exit_ms = 180
        "#,
    )
    .unwrap();
    let mut h = Harness::new(config);
    let (_, t) = h.confirm(RowId(1), Instant::now());
    assert_eq!(h.list.row_exit(RowId(1)).unwrap().duration(), 180 * MS);
    assert_eq!(h.list.interaction(RowId(1), t).unwrap().offset_x, 0.0);
}
