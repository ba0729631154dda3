//! Dynamic WHERE / SET clause assembly for listing and partial updates.
//!
//! Column names are always `&'static str` supplied by the models; only
//! values coming from the request are bound as parameters.

use chrono::NaiveDate;
use sqlx::{
    Encode, FromRow, QueryBuilder, Sqlite, SqlitePool, Type,
    query::QueryAs,
    sqlite::{SqliteArguments, SqliteRow},
};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

/// Newest rows first; rowid breaks ties between rows created in the same millisecond.
pub const NEWEST_FIRST: &str = "created_at DESC, rowid DESC";

/// Lowercased copy of a row's searchable text. SQLite's `LOWER()` only folds
/// ASCII, so the folding happens in Rust before the row is stored.
pub const SEARCH_COLUMN: &str = "busqueda";

/// Text fields of a row that free-text search matches against.
pub trait Searchable {
    fn search_fields(&self) -> Vec<Option<&str>>;
}

/// Contents of [`SEARCH_COLUMN`] for a row with the given fields.
pub fn search_text<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    fields
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Uuid(Uuid),
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        FilterValue::Text(value.clone())
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Uuid(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        FilterValue::Date(value)
    }
}

impl FilterValue {
    fn bind(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            FilterValue::Text(v) => qb.push_bind(v.clone()),
            FilterValue::Uuid(v) => qb.push_bind(*v),
            FilterValue::Bool(v) => qb.push_bind(*v),
            FilterValue::Int(v) => qb.push_bind(*v),
            FilterValue::Date(v) => qb.push_bind(*v),
        };
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    Compare {
        column: &'static str,
        op: &'static str,
        value: FilterValue,
    },
    Search(String),
    Raw(&'static str),
}

/// Conjunction of optional predicates. `None` filters are dropped so that
/// handlers can pass their query parameters straight through.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    predicates: Vec<Predicate>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed SQL fragment, e.g. `deleted_at IS NULL`.
    pub fn raw(mut self, sql: &'static str) -> Self {
        self.predicates.push(Predicate::Raw(sql));
        self
    }

    pub fn eq<V: Into<FilterValue>>(self, column: &'static str, value: Option<V>) -> Self {
        self.compare(column, "=", value)
    }

    pub fn gte<V: Into<FilterValue>>(self, column: &'static str, value: Option<V>) -> Self {
        self.compare(column, ">=", value)
    }

    pub fn lte<V: Into<FilterValue>>(self, column: &'static str, value: Option<V>) -> Self {
        self.compare(column, "<=", value)
    }

    fn compare<V: Into<FilterValue>>(
        mut self,
        column: &'static str,
        op: &'static str,
        value: Option<V>,
    ) -> Self {
        if let Some(value) = value {
            self.predicates.push(Predicate::Compare {
                column,
                op,
                value: value.into(),
            });
        }
        self
    }

    /// Case-insensitive substring match against [`SEARCH_COLUMN`]. Blank terms are ignored.
    pub fn search(mut self, term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            self.predicates.push(Predicate::Search(like_pattern(term)));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Appends ` WHERE …` (or nothing) to `qb`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::Compare { column, op, value } => {
                    qb.push(format!("{column} {op} "));
                    value.bind(qb);
                }
                Predicate::Search(pattern) => {
                    qb.push(format!("{SEARCH_COLUMN} LIKE "));
                    qb.push_bind(pattern.clone());
                    qb.push(" ESCAPE '\\'");
                }
                Predicate::Raw(sql) => {
                    qb.push(*sql);
                }
            }
        }
    }
}

/// `%term%`, lowercased, with LIKE metacharacters escaped by backslash.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Runs the COUNT and the paged SELECT against `table` with identical predicates.
pub async fn fetch_page<T>(
    pool: &SqlitePool,
    table: &str,
    filters: &Filters,
    order_by: &str,
    page: &PageRequest,
) -> Result<Page<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {table}"));
    filters.push_where(&mut count);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {table}"));
    filters.push_where(&mut select);
    select.push(format!(" ORDER BY {order_by} LIMIT "));
    select.push_bind(i64::from(page.limit()));
    select.push(" OFFSET ");
    select.push_bind(page.offset());
    let items = select.build_query_as::<T>().fetch_all(pool).await?;

    Ok(Page::new(items, page, total))
}

/// Runs an `INSERT`/`UPDATE … RETURNING *` for row `id` and rewrites its
/// [`SEARCH_COLUMN`] from the returned row, both in one transaction.
pub async fn fetch_indexed<'q, T>(
    pool: &SqlitePool,
    table: &str,
    id: Uuid,
    query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Searchable + Send + Unpin,
{
    let mut tx = pool.begin().await?;
    let row = query.fetch_optional(&mut *tx).await?;
    if let Some(row) = &row {
        let sql = format!("UPDATE {table} SET {SEARCH_COLUMN} = $1 WHERE id = $2");
        sqlx::query(&sql)
            .bind(search_text(row.search_fields()))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(row)
}

/// SET clause built from whichever payload fields are present.
pub struct Assignments<'args> {
    qb: QueryBuilder<'args, Sqlite>,
    count: usize,
    touch_updated_at: bool,
    scopes: Vec<(&'static str, FilterValue)>,
}

impl<'args> Assignments<'args> {
    pub fn new(table: &str) -> Self {
        Self {
            qb: QueryBuilder::new(format!("UPDATE {table} SET ")),
            count: 0,
            touch_updated_at: true,
            scopes: Vec::new(),
        }
    }

    /// For tables without an `updated_at` column.
    pub fn without_timestamp(mut self) -> Self {
        self.touch_updated_at = false;
        self
    }

    pub fn set<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Sqlite> + Type<Sqlite>,
    {
        if let Some(value) = value {
            if self.count > 0 {
                self.qb.push(", ");
            }
            self.qb.push(format!("{column} = "));
            self.qb.push_bind(value);
            self.count += 1;
        }
        self
    }

    /// Restricts the update to rows where `column = value`, e.g. the owner.
    pub fn scope_eq<V: Into<FilterValue>>(&mut self, column: &'static str, value: V) -> &mut Self {
        self.scopes.push((column, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    /// Completes `UPDATE … WHERE id = ? [AND column = ?…] [AND scope] RETURNING *`.
    /// `None` when no column was assigned.
    pub fn finish(mut self, id: Uuid, scope: Option<&'static str>) -> Option<QueryBuilder<'args, Sqlite>> {
        if self.count == 0 {
            return None;
        }
        if self.touch_updated_at {
            self.qb.push(", updated_at = datetime('now', 'subsec')");
        }
        self.qb.push(" WHERE id = ");
        self.qb.push_bind(id);
        for (column, value) in &self.scopes {
            self.qb.push(format!(" AND {column} = "));
            value.bind(&mut self.qb);
        }
        if let Some(scope) = scope {
            self.qb.push(" AND ");
            self.qb.push(scope);
        }
        self.qb.push(" RETURNING *");
        Some(self.qb)
    }
}
