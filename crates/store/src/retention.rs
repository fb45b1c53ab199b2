//! Bounded retention for the append-only tables.
//!
//! Every log table keeps only its newest [`RETAINED_ROWS`] rows, newest
//! meaning greatest value of the table's ordering column.

use sqlx::PgConnection;

/// Rows kept per table.
pub const RETAINED_ROWS: i64 = 20;

/// The append-only tables under retention. Table and column names are
/// interpolated into SQL, so they only ever come from this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainedTable {
    Credentials,
    Checkpoints,
    StartupNotices,
}

impl RetainedTable {
    pub const ALL: [RetainedTable; 3] = [
        RetainedTable::Credentials,
        RetainedTable::Checkpoints,
        RetainedTable::StartupNotices,
    ];

    pub fn table(self) -> &'static str {
        match self {
            RetainedTable::Credentials => "credentials",
            RetainedTable::Checkpoints => "checkpoints",
            RetainedTable::StartupNotices => "startup_notices",
        }
    }

    pub fn order_column(self) -> &'static str {
        match self {
            RetainedTable::Credentials => "retrieved_at_ms",
            RetainedTable::Checkpoints => "latest_checked_s",
            RetainedTable::StartupNotices => "id",
        }
    }
}

/// Take the retention lock on `table` until the surrounding transaction ends.
///
/// The mode conflicts with itself and with plain inserts, so writers must
/// take it before inserting. Taking it again in the same transaction is a
/// no-op.
pub async fn lock(conn: &mut PgConnection, table: RetainedTable) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE",
        table.table()
    ))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete everything but the newest [`RETAINED_ROWS`] rows of `table`.
///
/// Must run inside a transaction: the table lock taken here keeps concurrent
/// inserts out between the count and the delete, and is released on commit.
/// Returns the number of rows deleted.
pub async fn prune(conn: &mut PgConnection, table: RetainedTable) -> Result<u64, sqlx::Error> {
    let name = table.table();
    let order = table.order_column();

    lock(&mut *conn, table).await?;

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {name}"))
        .fetch_one(&mut *conn)
        .await?;

    if count <= RETAINED_ROWS {
        return Ok(0);
    }

    let deleted = sqlx::query(&format!(
        r#"
        DELETE FROM {name}
        WHERE id IN (
            SELECT id FROM {name}
            ORDER BY {order} DESC, id DESC
            OFFSET $1
        )
        "#
    ))
    .bind(RETAINED_ROWS)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    tracing::debug!(table = name, count, deleted, "Pruned old rows");
    Ok(deleted)
}
