//! Search/filter query construction
//!
//! A `SearchQuery` is a pure description of what the user typed plus
//! the calendar filter; `build` turns it into SQL and parameters, and
//! the repository executes it. A leading `#` switches from title
//! substring to tag substring matching.

use crate::config::DATE_FORMAT;
use chrono::NaiveDate;

/// Whether results span all time or one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    All,
    On(NaiveDate),
}

/// A search over notes
#[derive(Debug, Clone)]
pub struct SearchQuery {
    text: String,
    date: DateFilter,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, date: DateFilter) -> Self {
        Self {
            text: text.into().trim().to_string(),
            date,
        }
    }

    /// The tag substring, if this is a `#tag` query
    fn tag_term(&self) -> Option<&str> {
        self.text.strip_prefix('#').map(str::trim)
    }

    /// Build `(sql, params)` for this query.
    ///
    /// Every branch orders by creation time descending so the result
    /// list is stable regardless of which filter produced it.
    pub fn build(&self) -> (String, Vec<String>) {
        let date_param = match self.date {
            DateFilter::All => None,
            DateFilter::On(day) => Some(day.format(DATE_FORMAT).to_string()),
        };

        if let Some(tag) = self.tag_term() {
            let mut sql = String::from(
                "SELECT DISTINCT n.id, n.title, n.created FROM notes n \
                 JOIN note_tags nt ON n.id = nt.note_id \
                 JOIN tags t ON nt.tag_id = t.id \
                 WHERE t.name LIKE ?",
            );
            let mut params = vec![format!("%{}%", tag)];

            if let Some(day) = date_param {
                sql.push_str(" AND DATE(n.created) = ?");
                params.push(day);
            }

            sql.push_str(" ORDER BY n.created DESC");
            return (sql, params);
        }

        let mut sql = String::from("SELECT id, title, created FROM notes");
        let mut params = Vec::new();
        let mut clauses = Vec::new();

        if !self.text.is_empty() {
            clauses.push("title LIKE ?");
            params.push(format!("%{}%", self.text));
        }

        if let Some(day) = date_param {
            clauses.push("DATE(created) = ?");
            params.push(day);
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY created DESC");
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_all_mode_has_no_restriction() {
        let (sql, params) = SearchQuery::new("", DateFilter::All).build();

        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY created DESC"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_scoped_mode_filters_by_day() {
        let (sql, params) = SearchQuery::new("", DateFilter::On(day("2025-03-02"))).build();

        assert!(sql.contains("DATE(created) = ?"));
        assert_eq!(params, vec!["2025-03-02".to_string()]);
    }

    #[test]
    fn test_title_search_combines_with_date() {
        let (sql, params) =
            SearchQuery::new("Grocer", DateFilter::On(day("2025-03-02"))).build();

        assert!(sql.contains("title LIKE ?"));
        assert!(sql.contains("AND DATE(created) = ?"));
        assert_eq!(
            params,
            vec!["%Grocer%".to_string(), "2025-03-02".to_string()]
        );
    }

    #[test]
    fn test_tag_query_joins_through_links() {
        let (sql, params) = SearchQuery::new("#shopping", DateFilter::All).build();

        assert!(sql.starts_with("SELECT DISTINCT"));
        assert!(sql.contains("JOIN note_tags"));
        assert!(sql.contains("t.name LIKE ?"));
        assert!(!sql.contains("DATE("));
        assert_eq!(params, vec!["%shopping%".to_string()]);
    }

    #[test]
    fn test_tag_query_trims_remainder() {
        let (_, params) = SearchQuery::new("#  shopping ", DateFilter::All).build();

        assert_eq!(params, vec!["%shopping%".to_string()]);
    }

    #[test]
    fn test_tag_query_scoped() {
        let (sql, params) =
            SearchQuery::new("#work", DateFilter::On(day("2025-01-15"))).build();

        assert!(sql.contains("AND DATE(n.created) = ?"));
        assert_eq!(params, vec!["%work%".to_string(), "2025-01-15".to_string()]);
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let (sql, params) = SearchQuery::new("  Grocer  ", DateFilter::All).build();

        assert!(sql.contains("title LIKE ?"));
        assert_eq!(params, vec!["%Grocer%".to_string()]);
    }
}
