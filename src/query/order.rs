use super::error::QueryError;
use super::types::{OrderInfo, QuerySpec, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Resolve `sortBy` / `sortOrder` against the resource's sortable columns.
    ///
    /// A blank `sortBy` means the resource default. An unrecognised direction
    /// keeps the default direction rather than failing the request.
    pub fn resolve(
        spec: &QuerySpec,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Result<OrderInfo, QueryError> {
        let (default_column, default_sort) = spec.default_sort;

        let column = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            None => default_column,
            Some(requested) => {
                if !spec.is_sortable(requested) {
                    return Err(QueryError::InvalidSortColumn(requested.to_string()));
                }
                requested
            }
        };

        let sort = match sort_order.map(str::trim) {
            Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => default_sort,
        };

        Ok(OrderInfo {
            column: column.to_string(),
            sort,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> QuerySpec {
        QuerySpec {
            searchable: &["title"],
            filterable: &[],
            sortable: &["title", "price"],
            date_column: None,
            default_sort: ("created_at", SortDirection::Desc),
        }
    }

    #[test]
    fn blank_sort_uses_default() {
        let order = FilterOrder::resolve(&spec(), Some("  "), None).unwrap();
        assert_eq!(order.column, "created_at");
        assert_eq!(order.sort, SortDirection::Desc);
    }

    #[test]
    fn direction_is_case_insensitive() {
        let order = FilterOrder::resolve(&spec(), Some("price"), Some("ASC")).unwrap();
        assert_eq!(order.column, "price");
        assert_eq!(order.sort, SortDirection::Asc);
    }

    #[test]
    fn unknown_direction_keeps_default() {
        let order = FilterOrder::resolve(&spec(), Some("title"), Some("sideways")).unwrap();
        assert_eq!(order.sort, SortDirection::Desc);
    }

    #[test]
    fn rejects_columns_outside_allow_list() {
        let err = FilterOrder::resolve(&spec(), Some("id; DROP TABLE awards"), None).unwrap_err();
        assert!(matches!(err, QueryError::InvalidSortColumn(_)));
    }
}
