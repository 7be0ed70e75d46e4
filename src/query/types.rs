use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Recognized list parameters, as they arrive on the query string.
///
/// Everything is kept as raw text; normalization (defaults, clamping,
/// parsing) happens in the builder so that a malformed `page` does not
/// reject the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSet {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "sortBy", alias = "sort_by")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder", alias = "sort_order")]
    pub sort_order: Option<String>,
}

/// Per-resource column allow-lists. Only names listed here can ever reach
/// the generated SQL.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub searchable: &'static [&'static str],
    pub filterable: &'static [&'static str],
    pub sortable: &'static [&'static str],
    pub date_column: Option<&'static str>,
    pub default_sort: (&'static str, SortDirection),
}

impl QuerySpec {
    pub fn is_filterable(&self, column: &str) -> bool {
        self.filterable.contains(&column)
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        column == self.default_sort.0 || self.sortable.contains(&column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// `page` floors at 1; `limit` clamps to `[1, max_limit]`. Values that do
    /// not parse as integers fall back to the defaults.
    pub fn resolve(page: Option<&str>, limit: Option<&str>, limits: &QueryLimits) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let max_limit = limits.max_limit.max(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(limits.default_limit)
            .clamp(1, max_limit);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// A typed positional parameter. Binding happens in the repository.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

/// Ownership restriction appended to a list query. The column comes from the
/// resource registry, never from the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub column: &'static str,
    pub value: SqlValue,
}

#[derive(Debug, Clone)]
pub struct BuiltQuery {
    /// Conditions joined with AND, without the `WHERE` keyword. Empty when
    /// nothing constrains the query.
    pub where_clause: String,
    pub params: Vec<SqlValue>,
    pub order: OrderInfo,
    pub pagination: Pagination,
}

impl BuiltQuery {
    pub fn order_clause(&self) -> String {
        format!("ORDER BY \"{}\" {}", self.order.column, self.order.sort.to_sql())
    }

    pub fn select_sql(&self, table: &str) -> String {
        [
            format!("SELECT * FROM \"{}\"", table),
            self.where_sql(),
            self.order_clause(),
            format!("LIMIT {} OFFSET {}", self.pagination.limit, self.pagination.offset),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Shares `params` with `select_sql`; pagination does not apply.
    pub fn count_sql(&self, table: &str) -> String {
        let where_sql = self.where_sql();
        if where_sql.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", table)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" {}", table, where_sql)
        }
    }

    fn where_sql(&self) -> String {
        if self.where_clause.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.where_clause)
        }
    }
}
