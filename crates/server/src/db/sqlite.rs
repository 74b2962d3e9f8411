use std::{future::Future, path::Path, str::FromStr, time::Duration};

use async_trait::async_trait;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use tokio::{
    fs::create_dir_all,
    sync::{mpsc, oneshot},
};

use super::{Error, MetarSnapshot, SnapshotStore, TafSnapshot};

type WriteOperation = std::pin::Pin<Box<dyn Future<Output = ()> + Send>>;

/// Serializes all writes through one task so concurrent ingest batches
/// never contend on the sqlite write lock.
pub struct DatabaseWriter {
    write_tx: mpsc::UnboundedSender<WriteOperation>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for DatabaseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseWriter {
    pub fn new() -> Self {
        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<WriteOperation>();

        let handle = tokio::spawn(async move {
            while let Some(future) = write_rx.recv().await {
                future.await;
            }
        });

        Self {
            write_tx,
            _handle: handle,
        }
    }

    pub async fn execute<T, F, Fut>(&self, pool: SqlitePool, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(SqlitePool) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel::<Result<T, Error>>();

        let write_op = Box::pin(async move {
            let result = operation(pool).await;
            let _ = result_tx.send(result);
        });

        self.write_tx
            .send(write_op)
            .map_err(|_| Error::WriterClosed)?;

        result_rx.await.map_err(|_| Error::WriterClosed)?
    }
}

pub struct Database {
    pool: SqlitePool,
    writer: DatabaseWriter,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            writer: DatabaseWriter::new(),
        }
    }
}

impl Database {
    pub async fn new(path: &str) -> Result<Self, Error> {
        let db_path = format!("{}/snapshots.sqlite", path);

        if let Some(parent) = Path::new(&db_path).parent() {
            create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000")
            .pragma("cache_size", "-64000")
            .pragma("foreign_keys", "ON")
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            writer: DatabaseWriter::new(),
        };

        db.run_migrations().await?;
        info!("SQLite snapshot store initialized at: {}", db_path);

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_metar(row: &SqliteRow) -> MetarSnapshot {
    MetarSnapshot {
        station_id: row.get("station_id"),
        observed_at: row.get("observed_at"),
        fetched_at: row.get("fetched_at"),
        flight_category: row.get("flight_category"),
        ceiling_ft: row.get("ceiling_ft"),
        lowest_cloud_ft: row.get("lowest_cloud_ft"),
        visibility: row.get("visibility"),
        wind_direction: row.get("wind_direction"),
        wind_speed: row.get("wind_speed"),
        wind_gust: row.get("wind_gust"),
        temperature: row.get("temperature"),
        dewpoint: row.get("dewpoint"),
        altimeter: row.get("altimeter"),
        wx_string: row.get("wx_string"),
        raw_ob: row.get("raw_ob"),
    }
}

fn row_to_taf(row: &SqliteRow) -> TafSnapshot {
    TafSnapshot {
        station_id: row.get("station_id"),
        valid_from: row.get("valid_from"),
        valid_to: row.get("valid_to"),
        fetched_at: row.get("fetched_at"),
        category_now: row.get("category_now"),
        category_2h: row.get("category_2h"),
        category_4h: row.get("category_4h"),
        category_8h: row.get("category_8h"),
        category_24h: row.get("category_24h"),
        document: row.get("document"),
    }
}

const METAR_COLUMNS: &str = "station_id, observed_at, fetched_at, flight_category, ceiling_ft, \
     lowest_cloud_ft, visibility, wind_direction, wind_speed, wind_gust, \
     temperature, dewpoint, altimeter, wx_string, raw_ob";

const TAF_COLUMNS: &str = "station_id, valid_from, valid_to, fetched_at, category_now, \
     category_2h, category_4h, category_8h, category_24h, document";

#[async_trait]
impl SnapshotStore for Database {
    async fn store_metar(&self, snapshot: MetarSnapshot) -> Result<bool, Error> {
        let pool = self.pool.clone();

        self.writer
            .execute(pool, move |pool| async move {
                let result = sqlx::query(
                    "INSERT OR IGNORE INTO metar_snapshots (
                        station_id, observed_at, fetched_at, flight_category,
                        ceiling_ft, lowest_cloud_ft, visibility, wind_direction,
                        wind_speed, wind_gust, temperature, dewpoint, altimeter,
                        wx_string, raw_ob
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&snapshot.station_id)
                .bind(snapshot.observed_at)
                .bind(snapshot.fetched_at)
                .bind(&snapshot.flight_category)
                .bind(snapshot.ceiling_ft)
                .bind(snapshot.lowest_cloud_ft)
                .bind(&snapshot.visibility)
                .bind(snapshot.wind_direction)
                .bind(snapshot.wind_speed)
                .bind(snapshot.wind_gust)
                .bind(snapshot.temperature)
                .bind(snapshot.dewpoint)
                .bind(snapshot.altimeter)
                .bind(&snapshot.wx_string)
                .bind(&snapshot.raw_ob)
                .execute(&pool)
                .await?;

                Ok(result.rows_affected() > 0)
            })
            .await
    }

    async fn store_taf(&self, snapshot: TafSnapshot) -> Result<bool, Error> {
        let pool = self.pool.clone();

        self.writer
            .execute(pool, move |pool| async move {
                let result = sqlx::query(
                    "INSERT OR IGNORE INTO taf_snapshots (
                        station_id, valid_from, valid_to, fetched_at,
                        category_now, category_2h, category_4h, category_8h,
                        category_24h, document
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&snapshot.station_id)
                .bind(snapshot.valid_from)
                .bind(snapshot.valid_to)
                .bind(snapshot.fetched_at)
                .bind(&snapshot.category_now)
                .bind(&snapshot.category_2h)
                .bind(&snapshot.category_4h)
                .bind(&snapshot.category_8h)
                .bind(&snapshot.category_24h)
                .bind(&snapshot.document)
                .execute(&pool)
                .await?;

                Ok(result.rows_affected() > 0)
            })
            .await
    }

    async fn stations(&self) -> Result<Vec<String>, Error> {
        let stations: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT station_id FROM (
                SELECT station_id FROM metar_snapshots
                UNION
                SELECT station_id FROM taf_snapshots
            ) ORDER BY station_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stations)
    }

    async fn latest_metars(&self, station_ids: &[String]) -> Result<Vec<MetarSnapshot>, Error> {
        let mut query = format!(
            "SELECT {METAR_COLUMNS} FROM metar_snapshots m
             WHERE observed_at = (
                 SELECT MAX(observed_at) FROM metar_snapshots
                 WHERE station_id = m.station_id
             )"
        );

        if !station_ids.is_empty() {
            let placeholders: String =
                station_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            query.push_str(&format!(" AND station_id IN ({})", placeholders));
        }
        query.push_str(" ORDER BY station_id");

        let mut q = sqlx::query(&query);
        for id in station_ids {
            q = q.bind(id);
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_metar).collect())
    }

    async fn latest_tafs(&self, station_ids: &[String]) -> Result<Vec<TafSnapshot>, Error> {
        let mut query = format!(
            "SELECT {TAF_COLUMNS} FROM taf_snapshots t
             WHERE fetched_at = (
                 SELECT MAX(fetched_at) FROM taf_snapshots
                 WHERE station_id = t.station_id
             )"
        );

        if !station_ids.is_empty() {
            let placeholders: String =
                station_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            query.push_str(&format!(" AND station_id IN ({})", placeholders));
        }
        query.push_str(" ORDER BY station_id, valid_from DESC");

        let mut q = sqlx::query(&query);
        for id in station_ids {
            q = q.bind(id);
        }

        let rows = q.fetch_all(&self.pool).await?;

        // An amended document can share a fetch time; keep the newest
        // validity window per station
        let mut snapshots: Vec<TafSnapshot> = Vec::new();
        for row in &rows {
            let snapshot = row_to_taf(row);
            let seen = snapshots
                .last()
                .is_some_and(|s| s.station_id == snapshot.station_id);
            if !seen {
                snapshots.push(snapshot);
            }
        }

        Ok(snapshots)
    }

    async fn metar_range(
        &self,
        station_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<MetarSnapshot>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {METAR_COLUMNS} FROM metar_snapshots
             WHERE station_id = ? AND observed_at >= ? AND observed_at < ?
             ORDER BY observed_at"
        ))
        .bind(station_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_metar).collect())
    }

    async fn taf_range(
        &self,
        station_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<TafSnapshot>, Error> {
        // Any document fetched before the range end whose validity reaches
        // past the range start could hold authority somewhere inside it
        let rows = sqlx::query(&format!(
            "SELECT {TAF_COLUMNS} FROM taf_snapshots
             WHERE station_id = ? AND fetched_at < ? AND valid_to > ?
             ORDER BY fetched_at, valid_from"
        ))
        .bind(station_id)
        .bind(end)
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_taf).collect())
    }

    async fn health_check(&self) -> Result<(), Error> {
        // Basic connectivity
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;

        // Page structure integrity
        let result: String = sqlx::query_scalar("PRAGMA quick_check;")
            .fetch_one(&self.pool)
            .await?;
        if result != "ok" {
            return Err(Error::Integrity(result));
        }

        Ok(())
    }
}
