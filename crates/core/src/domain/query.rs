// Query Descriptor

use crate::domain::value::SqlValue;

/// Composable filter/sort descriptor, passed through to the adapter verbatim.
///
/// Conditions use `?` placeholders and are ANDed together. The descriptor
/// never inspects or rewrites the clauses it carries.
#[derive(Debug, Clone, Default)]
pub struct Query {
    wheres: Vec<String>,
    args: Vec<SqlValue>,
    order_by: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND another condition. `clause` uses `?` placeholders matched by
    /// `args` in order.
    pub fn and_where(
        mut self,
        clause: impl Into<String>,
        args: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.wheres.push(clause.into());
        self.args.extend(args);
        self
    }

    /// Set the ordering expression, e.g. `"created_at DESC"`.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Bound arguments, in placeholder order.
    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    /// ` WHERE ...` fragment, empty when unfiltered. COUNT queries use this
    /// alone so ordering never leaks into them.
    pub fn where_sql(&self) -> String {
        if self.wheres.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.wheres.join(" AND "))
        }
    }

    /// Filter plus ordering, appended to a generated SELECT.
    pub fn suffix_sql(&self) -> String {
        let mut sql = self.where_sql();
        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        sql
    }
}
