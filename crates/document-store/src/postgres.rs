use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::{
    Collection, Condition, Document, DocumentId, FieldUpdate, Filter, Result, StoreError,
    UPDATED_AT_FIELD, Update, schema, store::DocumentStore,
};

/// PostgreSQL-backed document store.
///
/// Documents live in a single `documents` table as JSONB, keyed by
/// `(collection, id)`. Unique indexes are declared in the migration as
/// partial expression indexes, so the database itself rejects duplicates.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

/// A bind parameter for a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
enum SqlParam {
    Json(Value),
    Path(Vec<String>),
    Text(String),
}

/// Accumulates WHERE fragments and their parameters.
#[derive(Debug, Default)]
struct SqlBuilder {
    clauses: Vec<String>,
    params: Vec<SqlParam>,
}

impl SqlBuilder {
    /// Starts a builder whose first parameter ($1) is the collection name.
    fn for_collection(collection: Collection) -> Self {
        let mut builder = Self::default();
        let p = builder.push(SqlParam::Text(collection.as_str().to_string()));
        builder.clauses.push(format!("collection = {p}"));
        builder
    }

    fn push(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn add_filter(&mut self, filter: &Filter) {
        for condition in &filter.conditions {
            let clause = self.condition_sql(condition);
            self.clauses.push(clause);
        }
    }

    fn condition_sql(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Eq { path, value } => self.eq_sql(path, value),
            Condition::AnyOf { path, values } => {
                if values.is_empty() {
                    return "FALSE".to_string();
                }
                let parts: Vec<String> = values.iter().map(|v| self.eq_sql(path, v)).collect();
                format!("({})", parts.join(" OR "))
            }
            Condition::TextSearch { paths, needle } => {
                if paths.is_empty() {
                    return "FALSE".to_string();
                }
                let pattern = self.push(SqlParam::Text(format!("%{}%", escape_like(needle))));
                let parts: Vec<String> = paths
                    .iter()
                    .map(|path| {
                        let p = self.push(SqlParam::Path(path_segments(path)));
                        format!("(body #>> {p}) ILIKE {pattern}")
                    })
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            Condition::Exists { path } => {
                let p = self.push(SqlParam::Path(path_segments(path)));
                format!("COALESCE(body #> {p}, 'null'::jsonb) <> 'null'::jsonb")
            }
        }
    }

    fn eq_sql(&mut self, path: &str, value: &Value) -> String {
        if value.is_null() {
            let p = self.push(SqlParam::Path(path_segments(path)));
            return format!("COALESCE(body #> {p}, 'null'::jsonb) = 'null'::jsonb");
        }
        let p = self.push(SqlParam::Json(nest(path, value.clone())));
        if value.is_array() {
            return format!("body @> {p}");
        }
        // `@>` matches an array field only against an array operand.
        let member = self.push(SqlParam::Json(nest(path, Value::Array(vec![value.clone()]))));
        format!("(body @> {p} OR body @> {member})")
    }

    /// Builds the new body for an update, leaving unnamed fields untouched.
    fn update_sql(&mut self, update: &Update) -> String {
        let mut expr = "body".to_string();
        for change in &update.changes {
            expr = match change {
                FieldUpdate::Set { path, value } => {
                    let p = self.push(SqlParam::Path(path_segments(path)));
                    let v = self.push(SqlParam::Json(value.clone()));
                    format!("jsonb_set({expr}, {p}::text[], {v}::jsonb, true)")
                }
                FieldUpdate::PushFront { path, value } => {
                    let p = self.push(SqlParam::Path(path_segments(path)));
                    let v = self.push(SqlParam::Json(value.clone()));
                    let rest = format!(
                        "COALESCE((SELECT jsonb_agg(item ORDER BY ord) \
                         FROM jsonb_array_elements(CASE \
                         WHEN jsonb_typeof(body #> {p}::text[]) = 'array' \
                         THEN body #> {p}::text[] ELSE '[]'::jsonb END) \
                         WITH ORDINALITY AS t(item, ord) \
                         WHERE item <> {v}::jsonb), '[]'::jsonb)"
                    );
                    let head = format!("jsonb_build_array({v}::jsonb)");
                    format!("jsonb_set({expr}, {p}::text[], {head} || {rest}, true)")
                }
            };
        }
        expr
    }

    fn where_sql(&self) -> String {
        self.clauses.join(" AND ")
    }
}

fn path_segments(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

/// Builds `{"a": {"b": value}}` from `a.b`.
fn nest(path: &str, value: Value) -> Value {
    path.rsplit('.').fold(value, |acc, segment| {
        let mut map = Map::new();
        map.insert(segment.to_string(), acc);
        Value::Object(map)
    })
}

fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: Vec<SqlParam>,
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Json(v) => query.bind(v),
            SqlParam::Path(p) => query.bind(p),
            SqlParam::Text(t) => query.bind(t),
        };
    }
    query
}

fn map_write_error(collection: Collection, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && let Some(index) = db_err.constraint().and_then(schema::index_named)
    {
        tracing::debug!(%collection, index = index.name, "unique index violated");
        return StoreError::DuplicateKey {
            collection,
            index: index.name,
        };
    }
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some("documents_pkey")
    {
        return StoreError::DuplicateKey {
            collection,
            index: "_id",
        };
    }
    StoreError::Database(err)
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("document store migrations applied");
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        let body: Value = row.try_get("body")?;
        Document::from_value(body)
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[tracing::instrument(skip(self, document))]
    async fn insert(&self, collection: Collection, mut document: Document) -> Result<Document> {
        let now = Utc::now();
        let id = document.stamp_new(now);
        let created_at: DateTime<Utc> = document.created_at().unwrap_or(now);

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .bind(document.clone().into_value())
        .bind(created_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(document)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<Option<Document>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_document).transpose()
    }

    #[tracing::instrument(skip(self, filter))]
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        let mut builder = SqlBuilder::for_collection(collection);
        builder.add_filter(filter);
        let sql = format!(
            "SELECT body FROM documents WHERE {} ORDER BY created_at ASC, id ASC",
            builder.where_sql()
        );

        let rows = bind_all(sqlx::query(&sql), builder.params)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    #[tracing::instrument(skip(self, filter))]
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let mut builder = SqlBuilder::for_collection(collection);
        builder.add_filter(filter);
        let sql = format!(
            "SELECT COUNT(*) AS total FROM documents WHERE {}",
            builder.where_sql()
        );

        let row = bind_all(sqlx::query(&sql), builder.params)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }

    #[tracing::instrument(skip(self, document))]
    async fn replace(&self, collection: Collection, mut document: Document) -> Result<Document> {
        let id = document.require_id()?;
        let now = Utc::now();
        document.touch(now);

        let result = sqlx::query(
            r#"
            UPDATE documents SET body = $3, updated_at = $4
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .bind(document.clone().into_value())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(document)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, collection: Collection, id: DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, filter))]
    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>> {
        let mut builder = SqlBuilder::for_collection(collection);
        builder.add_filter(filter);
        let sql = format!(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = (
                SELECT id FROM documents WHERE {}
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING body
            "#,
            builder.where_sql()
        );

        let row = bind_all(sqlx::query(&sql), builder.params)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_document).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn increment(
        &self,
        collection: Collection,
        id: DocumentId,
        field: &str,
        by: i64,
    ) -> Result<Option<Document>> {
        let now = Utc::now();
        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE documents
            SET body = jsonb_set(
                    body,
                    $3::text[],
                    to_jsonb(COALESCE((body #>> $3::text[])::bigint, 0) + $4),
                    true
                ) || jsonb_build_object($5::text, $6::text),
                updated_at = $7
            WHERE collection = $1 AND id = $2
            RETURNING body
            "#,
        )
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .bind(path_segments(field))
        .bind(by)
        .bind(UPDATED_AT_FIELD)
        .bind(now.to_rfc3339())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    #[tracing::instrument(skip(self, filter, update))]
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>> {
        let now = Utc::now();
        let mut builder = SqlBuilder::for_collection(collection);
        builder.add_filter(filter);
        let body = builder.update_sql(update);
        let stamp_field = builder.push(SqlParam::Text(UPDATED_AT_FIELD.to_string()));
        let stamp = builder.push(SqlParam::Text(now.to_rfc3339()));
        let sql = format!(
            r#"
            UPDATE documents
            SET body = {body} || jsonb_build_object({stamp_field}::text, {stamp}::text),
                updated_at = {stamp}::timestamptz
            WHERE collection = $1 AND id = (
                SELECT id FROM documents WHERE {}
                ORDER BY created_at ASC, id ASC
                LIMIT 1
                FOR UPDATE
            )
            RETURNING body
            "#,
            builder.where_sql()
        );

        let row = bind_all(sqlx::query(&sql), builder.params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(collection, e))?;
        row.map(Self::row_to_document).transpose()
    }
}
