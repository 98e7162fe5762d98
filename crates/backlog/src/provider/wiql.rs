//! Translation from structured queries to WIQL statements.

use crate::model::{SortOrder, WorkItemQuery};

/// Build the WIQL statement for a structured query.
///
/// Each active filter list becomes one parenthesized OR-group; groups are
/// joined with AND. States, types, and assignees match by equality. Area
/// and iteration paths are hierarchical namespaces, so they match with
/// `UNDER`, which covers the path and all its descendants. Filter values
/// are embedded as quoted literals with single quotes doubled.
pub fn build_wiql(query: &WorkItemQuery) -> String {
    let filters = &query.filters;
    let predicates: Vec<String> = [
        any_equal("[System.State]", &filters.states),
        any_equal("[System.WorkItemType]", &filters.item_types),
        any_equal("[System.AssignedTo]", &filters.assigned_to),
        any_under("[System.AreaPath]", &filters.areas),
        any_under("[System.IterationPath]", &filters.iterations),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut wiql = String::from("SELECT [System.Id] FROM WorkItems");
    if !predicates.is_empty() {
        wiql.push_str(" WHERE ");
        wiql.push_str(&predicates.join(" AND "));
    }

    if let Some(order_by) = &query.order_by {
        let direction = match query.direction {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        wiql.push_str(&format!(" ORDER BY [{order_by}] {direction}"));
    }

    wiql
}

/// `([field] = 'a' OR [field] = 'b')`, or `None` for an empty list.
fn any_equal(field: &str, values: &[String]) -> Option<String> {
    or_group(values, |value| format!("{field} = '{}'", escape(value)))
}

/// `([field] UNDER 'path')` variants, or `None` for an empty list.
fn any_under(field: &str, values: &[String]) -> Option<String> {
    or_group(values, |value| format!("{field} UNDER '{}'", escape(value)))
}

fn or_group(values: &[String], clause: impl Fn(&str) -> String) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let clauses: Vec<String> = values.iter().map(|v| clause(v)).collect();
    Some(format!("({})", clauses.join(" OR ")))
}

/// WIQL string literals escape single quotes by doubling them.
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QueryFilters;

    fn query_with(filters: QueryFilters) -> WorkItemQuery {
        WorkItemQuery {
            filters,
            ..WorkItemQuery::default()
        }
    }

    #[test]
    fn states_become_a_parenthesized_or_group() {
        let query = query_with(QueryFilters {
            states: vec!["Active".to_string(), "Resolved".to_string()],
            ..QueryFilters::default()
        });

        assert_eq!(
            build_wiql(&query),
            "SELECT [System.Id] FROM WorkItems WHERE \
             ([System.State] = 'Active' OR [System.State] = 'Resolved')"
        );
    }

    #[test]
    fn paths_use_under_rather_than_equality() {
        let query = query_with(QueryFilters {
            areas: vec!["Team\\Backend".to_string()],
            ..QueryFilters::default()
        });

        let wiql = build_wiql(&query);
        assert!(wiql.contains("[System.AreaPath] UNDER 'Team\\Backend'"), "{wiql}");
        assert!(!wiql.contains("[System.AreaPath] ="), "{wiql}");
    }

    #[test]
    fn iterations_also_use_under() {
        let query = query_with(QueryFilters {
            iterations: vec!["Release 2\\Sprint 4".to_string()],
            ..QueryFilters::default()
        });

        assert!(build_wiql(&query).contains("[System.IterationPath] UNDER 'Release 2\\Sprint 4'"));
    }

    #[test]
    fn active_groups_are_joined_with_and() {
        let query = query_with(QueryFilters {
            states: vec!["Active".to_string()],
            item_types: vec!["Bug".to_string(), "Task".to_string()],
            areas: vec!["Team\\Backend".to_string()],
            ..QueryFilters::default()
        });

        assert_eq!(
            build_wiql(&query),
            "SELECT [System.Id] FROM WorkItems WHERE \
             ([System.State] = 'Active') AND \
             ([System.WorkItemType] = 'Bug' OR [System.WorkItemType] = 'Task') AND \
             ([System.AreaPath] UNDER 'Team\\Backend')"
        );
    }

    #[test]
    fn assignees_match_by_equality() {
        let query = query_with(QueryFilters {
            assigned_to: vec!["dana@acme.example".to_string()],
            ..QueryFilters::default()
        });

        assert!(build_wiql(&query).contains("([System.AssignedTo] = 'dana@acme.example')"));
    }

    #[test]
    fn order_by_appends_a_single_clause() {
        let mut query = query_with(QueryFilters {
            states: vec!["Active".to_string()],
            ..QueryFilters::default()
        });
        query.order_by = Some("System.ChangedDate".to_string());

        let wiql = build_wiql(&query);
        assert!(wiql.ends_with(" ORDER BY [System.ChangedDate] ASC"), "{wiql}");

        query.direction = SortOrder::Descending;
        let wiql = build_wiql(&query);
        assert!(wiql.ends_with(" ORDER BY [System.ChangedDate] DESC"), "{wiql}");
    }

    #[test]
    fn no_order_by_means_no_ordering_clause() {
        let query = query_with(QueryFilters {
            states: vec!["Active".to_string()],
            ..QueryFilters::default()
        });

        assert!(!build_wiql(&query).contains("ORDER BY"));
    }

    #[test]
    fn single_quotes_in_values_are_doubled() {
        let query = query_with(QueryFilters {
            assigned_to: vec!["Miles O'Brien".to_string()],
            ..QueryFilters::default()
        });

        assert!(build_wiql(&query).contains("= 'Miles O''Brien'"));
    }

    #[test]
    fn no_filters_yields_a_bare_select() {
        assert_eq!(
            build_wiql(&WorkItemQuery::default()),
            "SELECT [System.Id] FROM WorkItems"
        );
    }
}
