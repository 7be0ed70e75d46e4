use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use super::error::QueryError;
use super::order::FilterOrder;
use super::types::{BuiltQuery, FilterSet, OrderInfo, Pagination, QueryLimits, QuerySpec, Scope, SqlValue};

/// Turns a [`FilterSet`] into a parameterized WHERE / ORDER / LIMIT.
///
/// Placeholders are numbered in the order conditions are added, so
/// `params[i]` always belongs to `$i+1`.
pub struct QueryBuilder<'a> {
    spec: &'a QuerySpec,
    limits: QueryLimits,
    conditions: Vec<String>,
    params: Vec<SqlValue>,
    order: Option<OrderInfo>,
    page: Option<String>,
    limit: Option<String>,
}

/// Build with default limits and no ownership scope.
pub fn build(filters: &FilterSet, spec: &QuerySpec) -> Result<BuiltQuery, QueryError> {
    Ok(QueryBuilder::new(spec)?.apply(filters)?.finish())
}

impl<'a> QueryBuilder<'a> {
    pub fn new(spec: &'a QuerySpec) -> Result<Self, QueryError> {
        for column in spec
            .searchable
            .iter()
            .chain(spec.filterable)
            .chain(spec.sortable)
            .chain(spec.date_column.iter())
            .chain(std::iter::once(&spec.default_sort.0))
        {
            validate_identifier(column)?;
        }

        Ok(Self {
            spec,
            limits: QueryLimits::default(),
            conditions: vec![],
            params: vec![],
            order: None,
            page: None,
            limit: None,
        })
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn apply(mut self, filters: &FilterSet) -> Result<Self, QueryError> {
        self.page = filters.page.clone();
        self.limit = filters.limit.clone();

        if let Some(term) = non_blank(&filters.search) {
            self.search(term);
        }

        if let Some(status) = non_blank(&filters.status) {
            if self.spec.is_filterable("status") {
                self.compare("status", "=", SqlValue::Text(status.to_string()));
            } else {
                tracing::debug!("Ignoring status filter on resource without status column");
            }
        }

        if let Some(raw) = non_blank(&filters.category_id) {
            let id = raw.parse::<i64>().map_err(|_| QueryError::InvalidParameter {
                field: "category_id",
                value: raw.to_string(),
            })?;
            if self.spec.is_filterable("category_id") {
                self.compare("category_id", "=", SqlValue::Int(id));
            } else {
                tracing::debug!("Ignoring category filter on resource without category column");
            }
        }

        if let Some(column) = self.spec.date_column {
            if let Some(raw) = non_blank(&filters.date_from) {
                let (from, _) = parse_bound("date_from", raw, false)?;
                self.compare(column, ">=", from);
            }
            if let Some(raw) = non_blank(&filters.date_to) {
                let (to, exclusive) = parse_bound("date_to", raw, true)?;
                self.compare(column, if exclusive { "<" } else { "<=" }, to);
            }
        }

        self.order = Some(FilterOrder::resolve(
            self.spec,
            filters.sort_by.as_deref(),
            filters.sort_order.as_deref(),
        )?);

        Ok(self)
    }

    /// Restrict the query to rows owned by the caller.
    pub fn scope(mut self, scope: Option<Scope>) -> Result<Self, QueryError> {
        if let Some(scope) = scope {
            validate_identifier(scope.column)?;
            if scope.value == SqlValue::Null {
                // no owner id: matches nothing
                self.conditions.push("1=0".to_string());
            } else {
                self.compare(scope.column, "=", scope.value);
            }
        }
        Ok(self)
    }

    pub fn finish(self) -> BuiltQuery {
        let pagination = Pagination::resolve(self.page.as_deref(), self.limit.as_deref(), &self.limits);
        let order = self.order.unwrap_or_else(|| OrderInfo {
            column: self.spec.default_sort.0.to_string(),
            sort: self.spec.default_sort.1,
        });

        BuiltQuery {
            where_clause: self.conditions.join(" AND "),
            params: self.params,
            order,
            pagination,
        }
    }

    fn search(&mut self, term: &str) {
        let spec = self.spec;
        if spec.searchable.is_empty() {
            return;
        }
        let pattern = format!("%{}%", escape_like(term));
        let parts: Vec<String> = spec
            .searchable
            .iter()
            .map(|column| {
                let placeholder = self.param(SqlValue::Text(pattern.clone()));
                format!("\"{}\" ILIKE {}", column, placeholder)
            })
            .collect();
        self.conditions.push(format!("({})", parts.join(" OR ")));
    }

    fn compare(&mut self, column: &str, op: &str, value: SqlValue) {
        let placeholder = self.param(value);
        self.conditions.push(format!("\"{}\" {} {}", column, op, placeholder));
    }

    fn param(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<(), QueryError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Returns the bound and whether it is exclusive. A bare date used as an
/// upper bound covers the whole day, so it becomes `< next midnight`.
fn parse_bound(field: &'static str, raw: &str, upper: bool) -> Result<(SqlValue, bool), QueryError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok((SqlValue::Timestamp(ts.with_timezone(&Utc)), false));
    }

    let invalid = || QueryError::InvalidDate {
        field,
        value: raw.to_string(),
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    if upper {
        let next = date.succ_opt().ok_or_else(invalid)?;
        Ok((SqlValue::Timestamp(Utc.from_utc_datetime(&next.and_time(NaiveTime::MIN))), true))
    } else {
        Ok((SqlValue::Timestamp(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))), false))
    }
}
