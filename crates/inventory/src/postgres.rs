use std::collections::BTreeMap;

use async_trait::async_trait;
use common::{EventId, SectionId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    EventInventory, InventoryDelta, InventoryError, InventoryStore, Result, SectionInventory,
};

/// SQLSTATE `insufficient_privilege`.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// PostgreSQL-backed inventory projection.
///
/// Increments are applied with single-statement upserts, so concurrent
/// writers never lose updates.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_err(e: sqlx::Error) -> InventoryError {
        if let sqlx::Error::Database(ref db) = e
            && db.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE)
        {
            return InventoryError::PermissionDenied(db.message().to_string());
        }
        InventoryError::Database(e)
    }

    fn counter(event_id: &EventId, row: &PgRow, column: &str) -> Result<u32> {
        let value: i64 = row.try_get(column)?;
        u32::try_from(value).map_err(|_| InventoryError::Corrupt {
            event_id: event_id.to_string(),
            reason: format!("{column} out of range: {value}"),
        })
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn apply(&self, event_id: &EventId, delta: &InventoryDelta) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;

        sqlx::query(
            r#"
            INSERT INTO event_inventories (event_id, total_seats_sold, updated_at)
            VALUES ($1, GREATEST($2, 0), NOW())
            ON CONFLICT (event_id) DO UPDATE SET
                total_seats_sold = GREATEST(event_inventories.total_seats_sold + $2, 0),
                updated_at = NOW()
            "#,
        )
        .bind(event_id.as_str())
        .bind(delta.seats_sold)
        .execute(&mut *tx)
        .await
        .map_err(Self::map_err)?;

        for (section, change) in &delta.sections {
            sqlx::query(
                r#"
                INSERT INTO section_inventories (event_id, section_id, taken, unavailable, total)
                VALUES ($1, $2, GREATEST($3, 0), GREATEST($4, 0), $5)
                ON CONFLICT (event_id, section_id) DO UPDATE SET
                    taken = GREATEST(section_inventories.taken + $3, 0),
                    unavailable = GREATEST(section_inventories.unavailable + $4, 0),
                    total = $5
                "#,
            )
            .bind(event_id.as_str())
            .bind(section.as_str())
            .bind(change.taken)
            .bind(change.unavailable)
            .bind(change.total as i64)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }

        tx.commit().await.map_err(Self::map_err)?;

        tracing::debug!(
            event_id = %event_id,
            sections = delta.sections.len(),
            seats_sold = delta.seats_sold,
            "Applied inventory delta"
        );
        Ok(())
    }

    async fn snapshot(&self, event_id: &EventId) -> Result<Option<EventInventory>> {
        let row = sqlx::query(
            "SELECT total_seats_sold, updated_at FROM event_inventories WHERE event_id = $1",
        )
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let total_seats_sold: i64 = row.try_get("total_seats_sold")?;
        let mut inventory = EventInventory {
            event_id: event_id.clone(),
            sections: BTreeMap::new(),
            total_seats_sold: u64::try_from(total_seats_sold).map_err(|_| {
                InventoryError::Corrupt {
                    event_id: event_id.to_string(),
                    reason: format!("total_seats_sold out of range: {total_seats_sold}"),
                }
            })?,
            updated_at: row.try_get("updated_at")?,
        };

        let rows = sqlx::query(
            r#"
            SELECT section_id, taken, unavailable, total
            FROM section_inventories
            WHERE event_id = $1
            "#,
        )
        .bind(event_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        for row in rows {
            let section: String = row.try_get("section_id")?;
            inventory.sections.insert(
                SectionId::new(section),
                SectionInventory {
                    taken: Self::counter(event_id, &row, "taken")?,
                    unavailable: Self::counter(event_id, &row, "unavailable")?,
                    total: Self::counter(event_id, &row, "total")?,
                },
            );
        }

        Ok(Some(inventory))
    }

    async fn replace(&self, inventory: &EventInventory) -> Result<()> {
        let event_id = inventory.event_id.as_str();
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;

        sqlx::query(
            r#"
            INSERT INTO event_inventories (event_id, total_seats_sold, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id) DO UPDATE SET
                total_seats_sold = EXCLUDED.total_seats_sold,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(event_id)
        .bind(inventory.total_seats_sold as i64)
        .bind(inventory.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(Self::map_err)?;

        sqlx::query("DELETE FROM section_inventories WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;

        for (section, entry) in &inventory.sections {
            sqlx::query(
                r#"
                INSERT INTO section_inventories (event_id, section_id, taken, unavailable, total)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(event_id)
            .bind(section.as_str())
            .bind(entry.taken as i64)
            .bind(entry.unavailable as i64)
            .bind(entry.total as i64)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }

        tx.commit().await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn remove(&self, event_id: &EventId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM event_inventories WHERE event_id = $1")
            .bind(event_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;
        Ok(result.rows_affected() > 0)
    }
}
