//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p seat-ledger --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::OrderId;
use futures_util::StreamExt;
use seat_ledger::{
    EventId, LedgerError, Owner, PostgresTicketStore, SeatId, Ticket, TicketDetails, TicketId,
    TicketQuery, TicketStatus, TicketStore, TicketStoreExt, TicketWrite,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_tickets_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and a cleared ticket table
async fn get_test_store() -> PostgresTicketStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE tickets")
        .execute(&pool)
        .await
        .unwrap();

    PostgresTicketStore::new(pool)
}

fn create_test_ticket(event: &str, seat: &str, owner: Owner) -> Ticket {
    let seat_id = SeatId::new(seat);
    let section = seat_id.section().unwrap();
    Ticket::issue(
        EventId::new(event),
        seat_id,
        section,
        owner,
        OrderId::generate(),
        &TicketDetails::new("CofC vs UNCW", Utc::now())
            .owner_contact(Some("fan@example.com".into()), Some("Fan".into())),
        Utc::now(),
    )
}

/// Writes tickets through a single ledger transaction.
async fn seed(store: &PostgresTicketStore, tickets: Vec<Ticket>) {
    let keys: Vec<TicketId> = tickets.iter().map(|t| t.ticket_id.clone()).collect();
    let writes = tickets.into_iter().map(TicketWrite::Put).collect();
    store.transact(&keys, move |_| ((), writes)).await.unwrap();
}

#[tokio::test]
#[serial]
async fn put_and_get_ticket() {
    let store = get_test_store().await;
    let ticket = create_test_ticket("evt1", "110-A1", Owner::user("uid-a"));

    seed(&store, vec![ticket.clone()]).await;

    let stored = store.get_ticket(&ticket.ticket_id).await.unwrap().unwrap();
    assert_eq!(stored.ticket_id, ticket.ticket_id);
    assert_eq!(stored.owner, Owner::user("uid-a"));
    assert_eq!(stored.status, TicketStatus::Issued);
    assert_eq!(stored.qr_payload, ticket.qr_payload);
    assert_eq!(stored.owner_email.as_deref(), Some("fan@example.com"));
}

#[tokio::test]
#[serial]
async fn sentinel_owners_roundtrip() {
    let store = get_test_store().await;
    let reserved = create_test_ticket("evt1", "110-A1", Owner::AdminReserved);
    let unavailable = create_test_ticket("evt1", "110-A2", Owner::AdminUnavailable);

    seed(&store, vec![reserved.clone(), unavailable.clone()]).await;

    let stored = store.get_ticket(&reserved.ticket_id).await.unwrap().unwrap();
    assert_eq!(stored.owner, Owner::AdminReserved);
    let stored = store
        .get_ticket(&unavailable.ticket_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.owner, Owner::AdminUnavailable);
}

#[tokio::test]
#[serial]
async fn put_overwrites_inactive_ticket() {
    let store = get_test_store().await;
    let old = create_test_ticket("evt1", "110-A1", Owner::user("uid-a")).revoked(Utc::now());
    seed(&store, vec![old]).await;

    let fresh = create_test_ticket("evt1", "110-A1", Owner::user("uid-b"));
    seed(&store, vec![fresh.clone()]).await;

    let active = store
        .get_active_ticket(&EventId::new("evt1"), &SeatId::new("110-A1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.owner, Owner::user("uid-b"));
    assert!(active.revoked_at.is_none());
}

#[tokio::test]
#[serial]
async fn transact_without_writes_persists_nothing() {
    let store = get_test_store().await;
    let key = TicketId::from_raw("evt1_110-A1");

    let absent = store
        .transact(&[key.clone()], |current| (current[0].is_none(), vec![]))
        .await
        .unwrap();

    assert!(absent);
    assert!(store.get_ticket(&key).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn transact_rejects_unlocked_write() {
    let store = get_test_store().await;
    let stray = create_test_ticket("evt1", "110-A9", Owner::user("uid-a"));
    let stray_key = stray.ticket_id.clone();

    let result = store
        .transact(&[TicketId::from_raw("evt1_110-A1")], move |_| {
            ((), vec![TicketWrite::Put(stray)])
        })
        .await;

    assert!(matches!(result, Err(LedgerError::UnlockedWrite(_))));
    assert!(store.get_ticket(&stray_key).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn concurrent_transactions_on_same_seat_have_one_winner() {
    let store = get_test_store().await;
    let key = TicketId::from_raw("evt1_110-A1");

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            let ticket = create_test_ticket("evt1", "110-A1", Owner::user(format!("uid-{i}")));
            store
                .transact(&[key], move |current| {
                    let free = current[0].as_ref().is_none_or(|t| !t.is_active());
                    if free {
                        (true, vec![TicketWrite::Put(ticket)])
                    } else {
                        (false, vec![])
                    }
                })
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    let active = store
        .active_seats_for_event(&EventId::new("evt1"))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
#[serial]
async fn query_filters_and_pagination() {
    let store = get_test_store().await;
    seed(
        &store,
        vec![
            create_test_ticket("evt1", "110-A1", Owner::user("uid-a")),
            create_test_ticket("evt1", "110-A2", Owner::user("uid-a")),
            create_test_ticket("evt1", "111-A1", Owner::user("uid-b")),
            create_test_ticket("evt2", "110-A1", Owner::user("uid-a")).revoked(Utc::now()),
        ],
    )
    .await;

    let mine = store.list_tickets_for_user("uid-a").await.unwrap();
    assert_eq!(mine.len(), 3);

    let active_mine = store
        .query_tickets(TicketQuery::for_owner(Owner::user("uid-a")).active())
        .await
        .unwrap();
    assert_eq!(active_mine.len(), 2);

    let page = store
        .query_tickets(TicketQuery::for_event(EventId::new("evt1")).limit(2).offset(1))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    let section = store
        .query_tickets(
            TicketQuery::for_event(EventId::new("evt1")).section(seat_ledger::SectionId::new("111")),
        )
        .await
        .unwrap();
    assert_eq!(section.len(), 1);
    assert_eq!(section[0].owner, Owner::user("uid-b"));
}

#[tokio::test]
#[serial]
async fn stream_tickets_for_event() {
    let store = get_test_store().await;
    let tickets = (1..=25)
        .map(|n| create_test_ticket("evt1", &format!("201-B{n}"), Owner::user("uid-a")))
        .collect();
    seed(&store, tickets).await;

    let stream = store
        .stream_tickets_for_event(&EventId::new("evt1"))
        .await
        .unwrap();
    let tickets: Vec<_> = stream.collect().await;

    assert_eq!(tickets.len(), 25);
    assert!(tickets.iter().all(|t| t.is_ok()));
}

#[tokio::test]
#[serial]
async fn delete_removes_ticket() {
    let store = get_test_store().await;
    let ticket = create_test_ticket("evt1", "110-A1", Owner::user("uid-a"));
    let key = ticket.ticket_id.clone();
    seed(&store, vec![ticket]).await;

    let target = key.clone();
    store
        .transact(&[key.clone()], move |_| ((), vec![TicketWrite::Delete(target)]))
        .await
        .unwrap();

    assert!(store.get_ticket(&key).await.unwrap().is_none());
}
