//! List query model and filter/sort coordination.

use std::collections::BTreeMap;

/// Sort direction for the record list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Wire value expected by the backend (`asc`/`desc`).
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The full list query sent to the backend.
///
/// `filters` holds structured filters plus the free-text `search` entry;
/// empty values mean "filter absent". `BTreeMap` keeps equality deterministic
/// so identical queries can be de-duplicated downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    /// Current page, 1-based. Reset to 1 by any other mutation.
    pub page: usize,
    pub page_size: usize,
    pub sort_key: String,
    pub sort_direction: SortDirection,
    pub filters: BTreeMap<String, String>,
}

impl Query {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            sort_key: "lineNumber".into(),
            sort_direction: SortDirection::Ascending,
            filters: BTreeMap::new(),
        }
    }

    /// Set one filter value. Any change resets `page` to 1 so narrowing a
    /// filter can never leave the user on an empty page.
    pub fn apply_filter(&self, key: &str, value: &str) -> Self {
        let mut next = self.clone();
        if value.trim().is_empty() {
            next.filters.remove(key);
        } else {
            next.filters.insert(key.to_string(), value.to_string());
        }
        next.page = 1;
        next
    }

    /// Apply several filter updates at once; a single page reset.
    pub fn apply_filters<'a, I>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut next = self.clone();
        for (key, value) in updates {
            if value.trim().is_empty() {
                next.filters.remove(key);
            } else {
                next.filters.insert(key.to_string(), value.to_string());
            }
        }
        next.page = 1;
        next
    }

    /// Drop all filters and sorting and go back to page 1. Only the page
    /// size carries over; the sort returns to the default column.
    pub fn cleared(&self) -> Self {
        Self::new(self.page_size)
    }

    /// Toggle sorting: an already-active column flips direction, a new
    /// column starts ascending. Either way the page resets.
    pub fn toggle_sort(&self, key: &str) -> Self {
        let mut next = self.clone();
        if next.sort_key == key {
            next.sort_direction = next.sort_direction.flipped();
        } else {
            next.sort_key = key.to_string();
            next.sort_direction = SortDirection::Ascending;
        }
        next.page = 1;
        next
    }

    /// Jump to a page without touching anything else. The caller validates
    /// the range against the current window first.
    pub fn with_page(&self, page: usize) -> Self {
        let mut next = self.clone();
        next.page = page.max(1);
        next
    }

    /// Change the page size, keeping the old start position visible.
    pub fn with_page_size(&self, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let old_start_index = (self.page - 1) * self.page_size;
        let mut next = self.clone();
        next.page = crate::pagination::page_after_resize(old_start_index, page_size);
        next.page_size = page_size;
        next
    }

    /// Number of non-empty filters, shown as the UI badge count.
    pub fn active_filter_count(&self) -> usize {
        self.filters.values().filter(|v| !v.trim().is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_change_resets_page() {
        let q = Query::new(20).with_page(4);
        let q2 = q.apply_filter("agentCode", "9120001");
        assert_eq!(q2.page, 1);
        assert_eq!(q2.filters.get("agentCode").map(String::as_str), Some("9120001"));
        // Page size survives every mutation.
        assert_eq!(q2.page_size, 20);
    }

    #[test]
    fn test_empty_value_removes_filter() {
        let q = Query::new(20)
            .apply_filter("recordType", "BKS24")
            .apply_filter("search", "LH");
        assert_eq!(q.active_filter_count(), 2);
        let q = q.apply_filter("recordType", "");
        assert_eq!(q.active_filter_count(), 1);
        assert!(!q.filters.contains_key("recordType"));
        // Whitespace-only counts as absent too.
        let q = q.apply_filter("search", "   ");
        assert_eq!(q.active_filter_count(), 0);
    }

    #[test]
    fn test_apply_filters_batch() {
        let q = Query::new(10).with_page(3);
        let q = q.apply_filters([("agentCode", "9120001"), ("recordType", "BAR65"), ("search", "")]);
        assert_eq!(q.page, 1);
        assert_eq!(q.active_filter_count(), 2);
    }

    #[test]
    fn test_clear_retains_page_size_only() {
        let q = Query::new(50)
            .apply_filter("agentCode", "9120001")
            .toggle_sort("agentCode")
            .with_page(7);
        let q = q.cleared();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 50);
        assert_eq!(q.active_filter_count(), 0);
        // The sort does not survive a clear; it returns to the default.
        assert_eq!(q.sort_key, "lineNumber");
        assert_eq!(q.sort_direction, SortDirection::Ascending);
    }

    #[test]
    fn test_clear_resets_flipped_sort() {
        // A flipped sort on the default column is also reset.
        let q = Query::new(20)
            .toggle_sort("agentCode")
            .toggle_sort("agentCode");
        assert_eq!(q.sort_direction, SortDirection::Descending);
        let q = q.cleared();
        assert_eq!(q.sort_key, "lineNumber");
        assert_eq!(q.sort_direction, SortDirection::Ascending);
    }

    #[test]
    fn test_sort_toggle() {
        let q = Query::new(20).with_page(2);
        // A new column starts ascending and resets the page.
        let q = q.toggle_sort("agentCode");
        assert_eq!(q.sort_key, "agentCode");
        assert_eq!(q.sort_direction, SortDirection::Ascending);
        assert_eq!(q.page, 1);
        // The same column flips direction.
        let q = q.toggle_sort("agentCode");
        assert_eq!(q.sort_direction, SortDirection::Descending);
        let q = q.toggle_sort("agentCode");
        assert_eq!(q.sort_direction, SortDirection::Ascending);
    }

    #[test]
    fn test_page_size_change_preserves_position() {
        // Page 3 at 20/page starts at item 40; at 10/page that is page 5.
        let q = Query::new(20).with_page(3);
        let q = q.with_page_size(10);
        assert_eq!(q.page, 5);
        assert_eq!(q.page_size, 10);
        // Only the page jump itself keeps the page; everything else resets.
        let q = q.with_page(2);
        assert_eq!(q.page, 2);
    }
}
