//! Country persistence.
//!
//! [`CountryStore`] is the seam the pipeline, the HTTP handlers and the tests share;
//! [`SqliteCountryStore`] backs it with one `countries` table keyed by name plus an
//! `app_meta` key/value table holding the time of the last completed refresh.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Country, CountryDraft, UpsertOutcome};
use crate::query::ListQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Pool, QueryBuilder, Sqlite};
use std::str::FromStr;
use std::time::Duration;

const LAST_REFRESH_KEY: &str = "last_global_refresh";

#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Insert or overwrite the record sharing `draft.name`.
    async fn upsert(&self, draft: &CountryDraft) -> AppResult<UpsertOutcome>;

    async fn get_by_name(&self, name: &str) -> AppResult<Country>;

    async fn list(&self, query: &ListQuery) -> AppResult<Vec<Country>>;

    async fn delete_by_name(&self, name: &str) -> AppResult<()>;

    async fn count(&self) -> AppResult<u64>;

    async fn record_refresh(&self, at: DateTime<Utc>) -> AppResult<()>;

    async fn last_refresh(&self) -> AppResult<Option<DateTime<Utc>>>;
}

/// Row shape in the `countries` table. SQLite integers are signed.
#[derive(Debug, FromRow)]
struct CountryRow {
    id: i64,
    name: String,
    capital: Option<String>,
    region: Option<String>,
    population: i64,
    currency_code: Option<String>,
    exchange_rate: Option<f64>,
    estimated_gdp: Option<f64>,
    flag_url: Option<String>,
    last_refreshed_at: DateTime<Utc>,
}

impl From<CountryRow> for Country {
    fn from(r: CountryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            capital: r.capital,
            region: r.region,
            population: u64::try_from(r.population).unwrap_or(0),
            currency_code: r.currency_code,
            exchange_rate: r.exchange_rate,
            estimated_gdp: r.estimated_gdp,
            flag_url: r.flag_url,
            last_refreshed_at: r.last_refreshed_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at FROM countries";

/// SQLite-backed country store.
#[derive(Debug, Clone)]
pub struct SqliteCountryStore {
    pool: Pool<Sqlite>,
}

impl SqliteCountryStore {
    /// Connect using the configured URL and create the schema if needed.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        Self::connect_url(&config.database_url, config.database_max_connections).await
    }

    pub async fn connect_url(url: &str, max_connections: u32) -> AppResult<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            opts = opts.journal_mode(SqliteJournalMode::Wal);
        }

        // Every in-memory connection is a separate database: keep exactly one alive forever.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(opts)
                .await?
        };

        let store = Self { pool };
        store.migrate().await?;
        log::info!("Country store ready at {url}");
        Ok(store)
    }

    /// Fresh private in-memory database; handy for tests and dry runs.
    pub async fn in_memory() -> AppResult<Self> {
        Self::connect_url("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                capital TEXT,
                region TEXT,
                population INTEGER NOT NULL CHECK (population >= 0),
                currency_code TEXT,
                exchange_rate REAL,
                estimated_gdp REAL,
                flag_url TEXT,
                last_refreshed_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_countries_region ON countries (region COLLATE NOCASE)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_countries_currency ON countries (currency_code COLLATE NOCASE)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS app_meta (
                key TEXT PRIMARY KEY,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CountryStore for SqliteCountryStore {
    async fn upsert(&self, draft: &CountryDraft) -> AppResult<UpsertOutcome> {
        let population = i64::try_from(draft.population)
            .map_err(|_| AppError::Internal(format!("population of {} out of range", draft.name)))?;

        // Write first so the transaction holds the write lock from its first statement.
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE countries SET name = ?, capital = ?, region = ?, population = ?, \
                 currency_code = ?, exchange_rate = ?, estimated_gdp = ?, flag_url = ?, \
                 last_refreshed_at = ? \
             WHERE name = ?",
        )
        .bind(&draft.name)
        .bind(&draft.capital)
        .bind(&draft.region)
        .bind(population)
        .bind(&draft.currency_code)
        .bind(draft.exchange_rate)
        .bind(draft.estimated_gdp)
        .bind(&draft.flag_url)
        .bind(draft.refreshed_at)
        .bind(&draft.name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let outcome = if updated > 0 {
            UpsertOutcome::Updated
        } else {
            sqlx::query(
                "INSERT INTO countries (name, capital, region, population, currency_code, \
                     exchange_rate, estimated_gdp, flag_url, last_refreshed_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&draft.name)
            .bind(&draft.capital)
            .bind(&draft.region)
            .bind(population)
            .bind(&draft.currency_code)
            .bind(draft.exchange_rate)
            .bind(draft.estimated_gdp)
            .bind(&draft.flag_url)
            .bind(draft.refreshed_at)
            .execute(&mut *tx)
            .await?;
            UpsertOutcome::Created
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn get_by_name(&self, name: &str) -> AppResult<Country> {
        let sql = format!("{SELECT_COLUMNS} WHERE name = ?");
        let row: Option<CountryRow> = sqlx::query_as(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Country::from)
            .ok_or_else(|| AppError::country_not_found(name))
    }

    async fn list(&self, query: &ListQuery) -> AppResult<Vec<Country>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE 1 = 1");
        if let Some(region) = &query.region {
            qb.push(" AND region = ").push_bind(region.clone()).push(" COLLATE NOCASE");
        }
        if let Some(currency) = &query.currency {
            qb.push(" AND currency_code = ")
                .push_bind(currency.clone())
                .push(" COLLATE NOCASE");
        }
        qb.push(" ORDER BY ").push(query.sort.order_by_sql());

        let rows = qb.build_query_as::<CountryRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Country::from).collect())
    }

    async fn delete_by_name(&self, name: &str) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM countries WHERE name = ?")
            .bind(name.trim())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::country_not_found(name));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn record_refresh(&self, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO app_meta (key, updated_at) VALUES (?, ?) \
             ON CONFLICT (key) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .bind(LAST_REFRESH_KEY)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn last_refresh(&self) -> AppResult<Option<DateTime<Utc>>> {
        let at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT updated_at FROM app_meta WHERE key = ?")
                .bind(LAST_REFRESH_KEY)
                .fetch_optional(&self.pool)
                .await?;
        Ok(at)
    }
}
