// SqlValue -> sqlx Binding Shim

use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{Sqlite, SqliteArguments};
use strata_core::domain::SqlValue;

type RawQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;
type RawQueryAs<'q, T> = QueryAs<'q, Sqlite, T, SqliteArguments<'q>>;

/// Bind each value, in order, to the next `?` placeholder.
pub(crate) fn bind_all<'q>(mut query: RawQuery<'q>, values: &'q [SqlValue]) -> RawQuery<'q> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Blob(v) => query.bind(v.as_slice()),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Uuid(v) => query.bind(*v),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

/// Same as `bind_all`, for typed row queries.
pub(crate) fn bind_all_as<'q, T>(
    mut query: RawQueryAs<'q, T>,
    values: &'q [SqlValue],
) -> RawQueryAs<'q, T> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Blob(v) => query.bind(v.as_slice()),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Uuid(v) => query.bind(*v),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}
