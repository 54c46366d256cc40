//! `PostGIS` repository answering spatial queries over a point table.

use super::{TableName, models::SpatialRowRecord};
use crate::spatial::{
    domain::{Crs, Point, Polygon, SpatialQueryResult, SpatialRow},
    ports::{SpatialStore, SpatialStoreError, SpatialStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Double, Integer, Text};
use std::time::Duration;

/// `PostgreSQL` connection pool type used by the spatial adapter.
pub type SpatialPgPool = Pool<ConnectionManager<PgConnection>>;

const GEOGRAPHIC_DISTANCE: &str =
    "ST_Distance(geom::geography, ST_SetSRID(ST_MakePoint($2, $3), $1)::geography)";
const PLANAR_DISTANCE: &str = "ST_Distance(geom, ST_SetSRID(ST_MakePoint($2, $3), $1))";

/// `PostGIS`-backed spatial store.
///
/// Serves only the CRS its table is stored in. Coordinates are returned as
/// stored; geographic distances use a geography cast to yield metres.
#[derive(Debug, Clone)]
pub struct PostGisSpatialStore {
    pool: SpatialPgPool,
    table: TableName,
    table_crs: Crs,
}

impl PostGisSpatialStore {
    /// Creates a store from an existing pool.
    #[must_use]
    pub const fn new(pool: SpatialPgPool, table: TableName, table_crs: Crs) -> Self {
        Self {
            pool,
            table,
            table_crs,
        }
    }

    /// Builds a lazily connecting pool for `database_url`.
    ///
    /// Checkouts wait at most `pool_wait`; the server starts even when the
    /// database is down and reports it through the health surface.
    #[must_use]
    pub fn connect(
        database_url: &str,
        table: TableName,
        table_crs: Crs,
        pool_size: u32,
        pool_wait: Duration,
    ) -> Self {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size)
            .min_idle(Some(0))
            .connection_timeout(pool_wait)
            .build_unchecked(manager);
        Self::new(pool, table, table_crs)
    }

    /// Returns the queried table.
    #[must_use]
    pub const fn table(&self) -> &TableName {
        &self.table
    }

    /// Returns the CRS the table's geometries are stored in.
    #[must_use]
    pub const fn table_crs(&self) -> Crs {
        self.table_crs
    }

    async fn run_blocking<F, T>(&self, f: F) -> SpatialStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SpatialStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SpatialStoreError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(SpatialStoreError::unavailable)?
    }

    fn select(&self, distance: &str) -> String {
        format!(
            "SELECT row_number::text AS id, \
             ST_X(geom) AS x, \
             ST_Y(geom) AS y, \
             name, entity, sub_entity, description, source_url, \
             {distance} AS distance \
             FROM {table}",
            table = self.table
        )
    }

    fn distance_expression(crs: Crs) -> &'static str {
        if crs.is_geographic() {
            GEOGRAPHIC_DISTANCE
        } else {
            PLANAR_DISTANCE
        }
    }
}

fn map_query_error(err: DieselError) -> SpatialStoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => SpatialStoreError::unavailable(err),
        other => {
            tracing::warn!(error = %other, "spatial query rejected by database");
            SpatialStoreError::query("the spatial store rejected the query")
        }
    }
}

fn into_result(records: Vec<SpatialRowRecord>, crs: Crs) -> SpatialQueryResult {
    SpatialQueryResult::new(records.into_iter().map(SpatialRow::from).collect(), crs)
}

#[async_trait]
impl SpatialStore for PostGisSpatialStore {
    fn serves(&self, crs: Crs) -> bool {
        crs == self.table_crs
    }

    async fn query_region(&self, polygon: Polygon, crs: Crs) -> SpatialStoreResult<SpatialQueryResult> {
        let sql = format!(
            "{} WHERE ST_Intersects(geom, ST_GeomFromText($2, $1)) \
             ORDER BY row_number",
            self.select("NULL::float8")
        );
        let wkt = polygon.to_wkt();
        let records = self
            .run_blocking(move |connection| {
                diesel::sql_query(sql)
                    .bind::<Integer, _>(crs.srid())
                    .bind::<Text, _>(wkt)
                    .load::<SpatialRowRecord>(connection)
                    .map_err(map_query_error)
            })
            .await?;
        Ok(into_result(records, crs))
    }

    async fn nearest_to(
        &self,
        point: Point,
        crs: Crs,
        k: u16,
    ) -> SpatialStoreResult<SpatialQueryResult> {
        let sql = format!(
            "{} ORDER BY distance, row_number LIMIT $4",
            self.select(Self::distance_expression(crs))
        );
        let records = self
            .run_blocking(move |connection| {
                diesel::sql_query(sql)
                    .bind::<Integer, _>(crs.srid())
                    .bind::<Double, _>(point.x())
                    .bind::<Double, _>(point.y())
                    .bind::<BigInt, _>(i64::from(k))
                    .load::<SpatialRowRecord>(connection)
                    .map_err(map_query_error)
            })
            .await?;
        Ok(into_result(records, crs))
    }

    async fn within_distance(
        &self,
        point: Point,
        crs: Crs,
        radius: f64,
    ) -> SpatialStoreResult<SpatialQueryResult> {
        let distance = Self::distance_expression(crs);
        let sql = format!(
            "SELECT * FROM ({}) AS ranked WHERE distance <= $4 ORDER BY distance, id",
            self.select(distance)
        );
        let records = self
            .run_blocking(move |connection| {
                diesel::sql_query(sql)
                    .bind::<Integer, _>(crs.srid())
                    .bind::<Double, _>(point.x())
                    .bind::<Double, _>(point.y())
                    .bind::<Double, _>(radius)
                    .load::<SpatialRowRecord>(connection)
                    .map_err(map_query_error)
            })
            .await?;
        Ok(into_result(records, crs))
    }

    async fn ping(&self) -> SpatialStoreResult<()> {
        self.run_blocking(|connection| {
            diesel::sql_query("SELECT 1")
                .execute(connection)
                .map(|_| ())
                .map_err(SpatialStoreError::unavailable)
        })
        .await
    }
}
