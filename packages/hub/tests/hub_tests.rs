//! Integration tests for the fan-out hub.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use hub::{AutoRefresh, HubMessage, ProviderFuture, ReportProvider, attach_client, start_hub};
use report_core::{
    ClientEvent, DataType, DateRange, DepartmentalSalesRow, GroupKey, HourlySalesRow, HubCommand,
    ReportKind, ReportPayload,
};
use tokio::sync::mpsc;

/// Provider that serves canned rows, counts fetches and can be told to fail.
struct FakeProvider {
    fetches: AtomicUsize,
    failing: AtomicBool,
}

impl FakeProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ReportProvider for FakeProvider {
    fn fetch(&self, key: &GroupKey) -> ProviderFuture {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing.load(Ordering::SeqCst);
        let kind = key.kind;
        Box::pin(async move {
            if failing {
                return Err("report backend unavailable".to_string());
            }
            Ok(match kind {
                ReportKind::Departmental => ReportPayload::Departmental {
                    rows: vec![DepartmentalSalesRow {
                        department_id: 7,
                        department: "Produce".to_string(),
                        average: 14.2,
                        total_sales: 1420.0,
                        items: 100,
                    }],
                },
                ReportKind::Hourly => ReportPayload::Hourly {
                    rows: vec![HourlySalesRow {
                        hour: 9,
                        total_sales: 310.0,
                        transactions: 12,
                    }],
                },
                ReportKind::Employee => ReportPayload::Employee { rows: vec![] },
                ReportKind::Payment => ReportPayload::Payment { rows: vec![] },
            })
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn subscribe_cmd(report_type: &str, from: NaiveDate, to: NaiveDate, data_type: &str) -> HubCommand {
    HubCommand::SubscribeToReport {
        report_type: report_type.to_string(),
        from_date: from,
        to_date: to,
        data_type: DataType::new(data_type),
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn connection_count(hub: &hub::ActorRef<hub::HubMessage>) -> usize {
    let result = ractor::rpc::call(hub, |reply| HubMessage::GetConnectionCount { reply }, None)
        .await
        .unwrap();
    match result {
        ractor::rpc::CallResult::Success(count) => count,
        other => panic!("connection count call failed: {:?}", other),
    }
}

async fn assert_no_event(events: &mut mpsc::UnboundedReceiver<ClientEvent>) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Ok(event) = events.try_recv() {
        panic!("unexpected event: {:?}", event);
    }
}

#[tokio::test]
async fn subscribe_pushes_an_immediate_snapshot() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let mut link = attach_client(hub.clone());
    link.commands
        .send(subscribe_cmd(
            "departmental",
            date(2024, 1, 1),
            date(2024, 1, 31),
            "Net",
        ))
        .unwrap();

    let event = next_event(&mut link.events).await;
    match event {
        ClientEvent::UpdateDepartmentalReport { payload } => {
            assert_eq!(payload.kind(), ReportKind::Departmental);
        }
        other => panic!("expected departmental update, got {:?}", other),
    }

    // Exactly one push for the subscribe, nothing queued behind it.
    assert_no_event(&mut link.events).await;
    assert_eq!(provider.fetch_count(), 1);
}

#[tokio::test]
async fn push_update_reaches_exactly_the_group_members() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let mut first = attach_client(hub.clone());
    let mut second = attach_client(hub.clone());
    let mut other = attach_client(hub.clone());

    let from = date(2024, 1, 1);
    let to = date(2024, 1, 31);
    first
        .commands
        .send(subscribe_cmd("hourly", from, to, "Net"))
        .unwrap();
    second
        .commands
        .send(subscribe_cmd("hourly", from, to, "Net"))
        .unwrap();
    // Same kind, different date range: a different group.
    other
        .commands
        .send(subscribe_cmd("hourly", date(2024, 2, 1), date(2024, 2, 28), "Net"))
        .unwrap();

    // Drain the subscribe snapshots.
    next_event(&mut first.events).await;
    next_event(&mut second.events).await;
    next_event(&mut other.events).await;

    let key = GroupKey::new(
        ReportKind::Hourly,
        DateRange::new(from, to),
        DataType::default(),
    );
    hub.send_message(HubMessage::PushUpdate {
        key,
        triggered_by: None,
    })
    .unwrap();

    assert!(matches!(
        next_event(&mut first.events).await,
        ClientEvent::UpdateHourlyReport { .. }
    ));
    assert!(matches!(
        next_event(&mut second.events).await,
        ClientEvent::UpdateHourlyReport { .. }
    ));
    assert_no_event(&mut other.events).await;
}

#[tokio::test]
async fn unsubscribe_never_subscribed_is_a_silent_no_op() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider).await.unwrap();

    let mut link = attach_client(hub);
    link.commands
        .send(HubCommand::UnsubscribeFromReport {
            report_type: "payment".to_string(),
            from_date: date(2024, 3, 1),
            to_date: date(2024, 3, 31),
            data_type: DataType::default(),
        })
        .unwrap();

    assert_no_event(&mut link.events).await;
}

#[tokio::test]
async fn provider_failure_is_reported_to_the_caller_only() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let from = date(2024, 1, 1);
    let to = date(2024, 1, 31);

    // Y joins while the provider is healthy.
    let mut bystander = attach_client(hub.clone());
    bystander
        .commands
        .send(subscribe_cmd("departmental", from, to, "Net"))
        .unwrap();
    next_event(&mut bystander.events).await;

    // X joins the same group while the provider is down.
    provider.set_failing(true);
    let mut caller = attach_client(hub.clone());
    caller
        .commands
        .send(subscribe_cmd("departmental", from, to, "Net"))
        .unwrap();

    match next_event(&mut caller.events).await {
        ClientEvent::ReportError { message } => {
            assert_eq!(message, "report backend unavailable");
        }
        other => panic!("expected report error, got {:?}", other),
    }
    assert_no_event(&mut bystander.events).await;
}

#[tokio::test]
async fn broadcast_failure_is_swallowed() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let from = date(2024, 1, 1);
    let to = date(2024, 1, 31);
    let mut link = attach_client(hub.clone());
    link.commands
        .send(subscribe_cmd("employee", from, to, "Net"))
        .unwrap();
    next_event(&mut link.events).await;

    provider.set_failing(true);
    hub.send_message(HubMessage::PushUpdate {
        key: GroupKey::new(
            ReportKind::Employee,
            DateRange::new(from, to),
            DataType::default(),
        ),
        triggered_by: None,
    })
    .unwrap();

    // No triggering caller, so nobody hears about the failure.
    assert_no_event(&mut link.events).await;
}

#[tokio::test]
async fn notify_all_reaches_every_connected_client() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider).await.unwrap();

    let mut a = attach_client(hub.clone());
    let mut b = attach_client(hub.clone());

    a.commands
        .send(HubCommand::NotifyNewTransaction {
            transaction_id: 42,
            amount: 19.99,
            department: "Deli".to_string(),
        })
        .unwrap();

    for link in [&mut a, &mut b] {
        match next_event(&mut link.events).await {
            ClientEvent::NewTransaction { record } => {
                assert_eq!(record.transaction_id, 42);
                assert_eq!(record.department, "Deli");
            }
            other => panic!("expected transaction notice, got {:?}", other),
        }
    }

    // A client connected after dispatch never receives the event.
    let mut late = attach_client(hub.clone());
    assert_no_event(&mut late.events).await;

    b.commands
        .send(HubCommand::NotifyLowStock {
            product_id: 9,
            product_name: "Oat milk".to_string(),
            current_stock: 2,
            reorder_level: 10,
        })
        .unwrap();
    for link in [&mut a, &mut b, &mut late] {
        assert!(matches!(
            next_event(&mut link.events).await,
            ClientEvent::LowStockAlert { .. }
        ));
    }
}

#[tokio::test]
async fn unknown_report_kind_is_ignored_without_crashing() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let mut link = attach_client(hub);
    link.commands
        .send(subscribe_cmd("weekly", date(2024, 1, 1), date(2024, 1, 7), "Net"))
        .unwrap();

    assert_no_event(&mut link.events).await;
    assert_eq!(provider.fetch_count(), 0);

    // The hub is still alive and answering.
    link.commands.send(HubCommand::Ping).unwrap();
    assert!(matches!(next_event(&mut link.events).await, ClientEvent::Pong));
}

#[tokio::test]
async fn ping_and_connection_count() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider).await.unwrap();

    let answer = ractor::rpc::call(&hub, |reply| HubMessage::Ping { reply }, None)
        .await
        .unwrap();
    assert!(matches!(answer, ractor::rpc::CallResult::Success(ref s) if s.as_str() == "pong"));

    let a = attach_client(hub.clone());
    let b = attach_client(hub.clone());
    // Let the Connect messages land.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(connection_count(&hub).await, 2);

    drop(a.commands);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(connection_count(&hub).await, 1);
    drop(b);
}

#[tokio::test]
async fn disconnect_removes_group_membership() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let from = date(2024, 1, 1);
    let to = date(2024, 1, 31);
    let mut leaver = attach_client(hub.clone());
    let mut stays = attach_client(hub.clone());
    leaver
        .commands
        .send(subscribe_cmd("payment", from, to, "Net"))
        .unwrap();
    stays
        .commands
        .send(subscribe_cmd("payment", from, to, "Net"))
        .unwrap();
    next_event(&mut leaver.events).await;
    next_event(&mut stays.events).await;

    drop(leaver.commands);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fetches_before = provider.fetch_count();
    hub.send_message(HubMessage::PushUpdate {
        key: GroupKey::new(
            ReportKind::Payment,
            DateRange::new(from, to),
            DataType::default(),
        ),
        triggered_by: None,
    })
    .unwrap();

    assert!(matches!(
        next_event(&mut stays.events).await,
        ClientEvent::UpdatePaymentReport { .. }
    ));
    assert_eq!(provider.fetch_count(), fetches_before + 1);
}

#[tokio::test]
async fn auto_refresh_re_pushes_active_groups_until_stopped() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let mut link = attach_client(hub.clone());
    link.commands
        .send(subscribe_cmd("departmental", date(2024, 1, 1), date(2024, 1, 31), "Net"))
        .unwrap();
    next_event(&mut link.events).await;

    let refresh = AutoRefresh::start(hub.clone(), Duration::from_millis(40));
    assert!(refresh.is_running());

    assert!(matches!(
        next_event(&mut link.events).await,
        ClientEvent::UpdateDepartmentalReport { .. }
    ));
    assert!(matches!(
        next_event(&mut link.events).await,
        ClientEvent::UpdateDepartmentalReport { .. }
    ));

    refresh.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    while link.events.try_recv().is_ok() {}
    assert_no_event(&mut link.events).await;
}

#[tokio::test]
async fn tick_skips_groups_with_no_members() {
    let provider = FakeProvider::new();
    let (hub, _handle) = start_hub(provider.clone()).await.unwrap();

    let mut link = attach_client(hub.clone());
    let from = date(2024, 1, 1);
    let to = date(2024, 1, 31);
    link.commands
        .send(subscribe_cmd("hourly", from, to, "Net"))
        .unwrap();
    next_event(&mut link.events).await;

    link.commands
        .send(HubCommand::UnsubscribeFromReport {
            report_type: "hourly".to_string(),
            from_date: from,
            to_date: to,
            data_type: DataType::default(),
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fetches_before = provider.fetch_count();
    hub.send_message(HubMessage::Tick).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(provider.fetch_count(), fetches_before);
    assert_no_event(&mut link.events).await;
}
