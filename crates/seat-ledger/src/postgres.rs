use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use common::OrderId;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

use crate::{
    EventId, LedgerError, Owner, Result, SeatId, SectionId, Ticket, TicketId, TicketQuery,
    TicketStatus,
    store::{TicketStore, TicketStream, TicketWrite, validate_transaction_writes},
};

const TICKET_COLUMNS: &str = "ticket_id, event_id, seat_id, section_id, owner_kind, owner_uid, \
     status, order_id, qr_payload, event_title, start_time, end_time, owner_email, owner_name, \
     invalid_reason, created_at, updated_at, revoked_at";

/// PostgreSQL-backed ticket ledger.
///
/// Transactions serialize per ticket key with transaction-scoped advisory
/// locks, so disjoint seat batches never wait on each other.
#[derive(Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    /// Creates a new PostgreSQL ticket ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations (ledger and inventory tables).
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_ticket(row: PgRow) -> Result<Ticket> {
        let ticket_id: String = row.try_get("ticket_id")?;

        let owner_kind: String = row.try_get("owner_kind")?;
        let owner = Owner::from_parts(&owner_kind, row.try_get("owner_uid")?).ok_or_else(|| {
            LedgerError::Corrupt {
                ticket_id: ticket_id.clone(),
                reason: format!("unknown owner kind '{owner_kind}'"),
            }
        })?;

        let status: String = row.try_get("status")?;
        let status = TicketStatus::parse(&status).ok_or_else(|| LedgerError::Corrupt {
            ticket_id: ticket_id.clone(),
            reason: format!("unknown status '{status}'"),
        })?;

        Ok(Ticket {
            ticket_id: TicketId::from_raw(ticket_id),
            event_id: EventId::new(row.try_get::<String, _>("event_id")?),
            seat_id: SeatId::new(row.try_get::<String, _>("seat_id")?),
            section: SectionId::new(row.try_get::<String, _>("section_id")?),
            owner,
            status,
            order_id: OrderId::from_raw(row.try_get::<String, _>("order_id")?),
            qr_payload: row.try_get("qr_payload")?,
            event_title: row.try_get("event_title")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            owner_email: row.try_get("owner_email")?,
            owner_name: row.try_get("owner_name")?,
            invalid_reason: row.try_get("invalid_reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            revoked_at: row.try_get("revoked_at")?,
        })
    }

    async fn write(conn: &mut PgConnection, write: &TicketWrite) -> Result<()> {
        match write {
            TicketWrite::Put(ticket) => {
                sqlx::query(
                    r#"
                    INSERT INTO tickets (ticket_id, event_id, seat_id, section_id, owner_kind,
                        owner_uid, status, order_id, qr_payload, event_title, start_time, end_time,
                        owner_email, owner_name, invalid_reason, created_at, updated_at, revoked_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
                    ON CONFLICT (ticket_id) DO UPDATE SET
                        event_id = EXCLUDED.event_id,
                        seat_id = EXCLUDED.seat_id,
                        section_id = EXCLUDED.section_id,
                        owner_kind = EXCLUDED.owner_kind,
                        owner_uid = EXCLUDED.owner_uid,
                        status = EXCLUDED.status,
                        order_id = EXCLUDED.order_id,
                        qr_payload = EXCLUDED.qr_payload,
                        event_title = EXCLUDED.event_title,
                        start_time = EXCLUDED.start_time,
                        end_time = EXCLUDED.end_time,
                        owner_email = EXCLUDED.owner_email,
                        owner_name = EXCLUDED.owner_name,
                        invalid_reason = EXCLUDED.invalid_reason,
                        created_at = EXCLUDED.created_at,
                        updated_at = EXCLUDED.updated_at,
                        revoked_at = EXCLUDED.revoked_at
                    "#,
                )
                .bind(ticket.ticket_id.as_str())
                .bind(ticket.event_id.as_str())
                .bind(ticket.seat_id.as_str())
                .bind(ticket.section.as_str())
                .bind(ticket.owner.kind())
                .bind(ticket.owner.uid())
                .bind(ticket.status.as_str())
                .bind(ticket.order_id.as_str())
                .bind(ticket.qr_payload.as_deref())
                .bind(&ticket.event_title)
                .bind(ticket.start_time)
                .bind(ticket.end_time)
                .bind(ticket.owner_email.as_deref())
                .bind(ticket.owner_name.as_deref())
                .bind(ticket.invalid_reason.as_deref())
                .bind(ticket.created_at)
                .bind(ticket.updated_at)
                .bind(ticket.revoked_at)
                .execute(&mut *conn)
                .await?;
            }
            TicketWrite::Delete(id) => {
                sqlx::query("DELETE FROM tickets WHERE ticket_id = $1")
                    .bind(id.as_str())
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn get_ticket(&self, ticket_id: &TicketId) -> Result<Option<Ticket>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = $1"
        ))
        .bind(ticket_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_ticket).transpose()
    }

    async fn query_tickets(&self, query: TicketQuery) -> Result<Vec<Ticket>> {
        let mut sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.event_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND event_id = ${param_count}"));
        }
        if query.seat_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND seat_id = ${param_count}"));
        }
        if query.section.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND section_id = ${param_count}"));
        }
        if let Some(ref owner) = query.owner {
            param_count += 1;
            sql.push_str(&format!(" AND owner_kind = ${param_count}"));
            if owner.uid().is_some() {
                param_count += 1;
                sql.push_str(&format!(" AND owner_uid = ${param_count}"));
            }
        }
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at ASC, ticket_id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        // Bind in the same order the placeholders were added
        let mut sqlx_query = sqlx::query(&sql);

        if let Some(ref event_id) = query.event_id {
            sqlx_query = sqlx_query.bind(event_id.as_str());
        }
        if let Some(ref seat_id) = query.seat_id {
            sqlx_query = sqlx_query.bind(seat_id.as_str());
        }
        if let Some(ref section) = query.section {
            sqlx_query = sqlx_query.bind(section.as_str());
        }
        if let Some(ref owner) = query.owner {
            sqlx_query = sqlx_query.bind(owner.kind());
            if let Some(uid) = owner.uid() {
                sqlx_query = sqlx_query.bind(uid);
            }
        }
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_ticket).collect()
    }

    async fn stream_tickets_for_event(&self, event_id: &EventId) -> Result<TicketStream> {
        use futures_util::TryStreamExt;

        let pool = self.pool.clone();
        let event_id = event_id.as_str().to_owned();
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = $1 \
             ORDER BY created_at ASC, ticket_id ASC"
        );

        let stream = async_stream::stream! {
            let mut rows = sqlx::query(&sql).bind(event_id).fetch(&pool);
            loop {
                match rows.try_next().await {
                    Ok(Some(row)) => yield Self::row_to_ticket(row),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(LedgerError::Database(e));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn transact<T, F>(&self, keys: &[TicketId], decide: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Vec<Option<Ticket>>) -> (T, Vec<TicketWrite>) + Send + 'static,
    {
        let mut tx = self.pool.begin().await?;
        let lock_start = Instant::now();

        // Lock in sorted order so overlapping batches cannot deadlock
        let mut lock_order: Vec<&str> = keys.iter().map(TicketId::as_str).collect();
        lock_order.sort_unstable();
        lock_order.dedup();
        for key in &lock_order {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(*key)
                .execute(&mut *tx)
                .await?;
        }
        metrics::histogram!("ledger_lock_wait_seconds").record(lock_start.elapsed().as_secs_f64());

        let key_strings: Vec<String> = lock_order.iter().map(|k| k.to_string()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ANY($1)"
        ))
        .bind(key_strings)
        .fetch_all(&mut *tx)
        .await?;

        let mut existing: HashMap<TicketId, Ticket> = HashMap::with_capacity(rows.len());
        for row in rows {
            let ticket = Self::row_to_ticket(row)?;
            existing.insert(ticket.ticket_id.clone(), ticket);
        }
        let current: Vec<Option<Ticket>> = keys.iter().map(|k| existing.get(k).cloned()).collect();

        let (outcome, writes) = decide(current);
        validate_transaction_writes(keys, &writes)?;

        if writes.is_empty() {
            tx.rollback().await?;
            return Ok(outcome);
        }

        for write in &writes {
            Self::write(&mut *tx, write).await?;
        }
        tx.commit().await?;
        tracing::debug!(keys = keys.len(), writes = writes.len(), "ledger transaction committed");

        Ok(outcome)
    }
}
