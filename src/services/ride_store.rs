use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    sqlite::{Sqlite, SqliteRow},
    Row,
};
use tracing::{debug, warn};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        pagination::Pagination,
        ride::{parse_stored_timestamp, PersonName, Ride, RidePage},
    },
};

/// Read access to the ride history.
#[async_trait]
pub trait RideStore: Send + Sync {
    /// Rides ordered by descending id, sliced to `pagination`. A page past
    /// the end is empty, not an error.
    async fn page(&self, pagination: Pagination) -> Result<RidePage, AppError>;
}

/// Bounds every call of the wrapped store by `timeout`.
#[derive(Clone)]
pub struct TimedStore {
    inner: Arc<dyn RideStore>,
    timeout: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn RideStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl RideStore for TimedStore {
    async fn page(&self, pagination: Pagination) -> Result<RidePage, AppError> {
        tokio::time::timeout(self.timeout, self.inner.page(pagination))
            .await
            .map_err(|_| AppError::StoreTimeout(self.timeout))?
    }
}

#[derive(Clone)]
pub struct SqliteRideStore {
    db: DbPool,
}

const PAGE_QUERY: &str = r#"
SELECT r.id, r.request_time, r.start_time, r.end_time, r.gender, r.affiliate_id, r.status,
       p.name AS passenger_name, d.name AS driver_name
FROM ride_history r
LEFT JOIN passengers p ON p.id = r.passenger_id
LEFT JOIN drivers d ON d.id = r.driver_id
ORDER BY r.id DESC
LIMIT ?1 OFFSET ?2
"#;

impl SqliteRideStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // SQLite has no planner estimate; the count is exact here but callers
    // only get the estimate contract.
    async fn estimate_total(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ride_history")
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }
}

#[async_trait]
impl RideStore for SqliteRideStore {
    async fn page(&self, pagination: Pagination) -> Result<RidePage, AppError> {
        debug!(
            page = pagination.page_index(),
            page_size = pagination.page_size(),
            "querying ride history"
        );
        let rows = sqlx::query(PAGE_QUERY)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.db)
            .await?;
        let rides = rows
            .iter()
            .map(ride_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let total = self.estimate_total().await?;
        Ok(RidePage { rides, total })
    }
}

/// `id` and `status` must decode; the other columns are written by the
/// dispatch system with no type guarantees and drop to `None` when they
/// don't.
fn ride_from_row(row: &SqliteRow) -> Result<Ride, AppError> {
    let id: i64 = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    Ok(Ride {
        id,
        request_time: parse_stored_timestamp(id, "request_time", lenient(row, id, "request_time")),
        start_time: parse_stored_timestamp(id, "start_time", lenient(row, id, "start_time")),
        end_time: parse_stored_timestamp(id, "end_time", lenient(row, id, "end_time")),
        gender: lenient(row, id, "gender"),
        affiliate_id: lenient(row, id, "affiliate_id"),
        status: status.into(),
        passengers: lenient(row, id, "passenger_name").map(|name| PersonName { name }),
        drivers: lenient(row, id, "driver_name").map(|name| PersonName { name }),
    })
}

fn lenient<'r, T>(row: &'r SqliteRow, ride_id: i64, column: &str) -> Option<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    match row.try_get::<Option<T>, _>(column) {
        Ok(value) => value,
        Err(err) => {
            warn!(ride_id, column, error = %err, "undecodable ride column");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{init_pool, run_migrations},
        models::ride::RideStatus,
    };
    use tempfile::TempDir;

    async fn store_with(rows: &[&str]) -> (SqliteRideStore, TempDir) {
        let root = TempDir::new().unwrap();
        let url = format!("sqlite://{}", root.path().join("rides.sqlite").to_string_lossy());
        let db = init_pool(&url).await.unwrap();
        run_migrations(&db).await.unwrap();
        for sql in rows {
            sqlx::query(sql).execute(&db).await.unwrap();
        }
        (SqliteRideStore::new(db), root)
    }

    struct NeverAnswers;

    #[async_trait]
    impl RideStore for NeverAnswers {
        async fn page(&self, _pagination: Pagination) -> Result<RidePage, AppError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn mistyped_passthrough_columns_become_absent() {
        let (store, _root) = store_with(&[
            "INSERT INTO ride_history (id, affiliate_id, gender, status) VALUES (1, 7, 'f', 'completed')",
            "INSERT INTO ride_history (id, affiliate_id, status) VALUES (2, 'AF-9', 'completed')",
        ])
        .await;

        let page = store.page(Pagination::new(0, 10).unwrap()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rides[0].id, 2);
        assert_eq!(page.rides[0].affiliate_id, None);
        assert_eq!(page.rides[0].status, RideStatus::Completed);
        assert_eq!(page.rides[1].affiliate_id, Some(7));
        assert_eq!(page.rides[1].gender.as_deref(), Some("f"));
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let timeout = Duration::from_millis(20);
        let store = TimedStore::new(Arc::new(NeverAnswers), timeout);

        let err = store.page(Pagination::new(0, 10).unwrap()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreTimeout(t) if t == timeout));
    }

    #[tokio::test]
    async fn timed_store_passes_results_through() {
        let (inner, _root) = store_with(&[
            "INSERT INTO ride_history (id, status) VALUES (1, 'requested')",
        ])
        .await;
        let store = TimedStore::new(Arc::new(inner), Duration::from_secs(2));

        let page = store.page(Pagination::new(0, 10).unwrap()).await.unwrap();
        assert_eq!(page.rides.len(), 1);
    }
}
