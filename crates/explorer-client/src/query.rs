//! Paginated dataset search.

use explorer_common::Key;

use crate::urls::datasets_url;

/// Page, page size and key constraints for a `/datasets` listing.
///
/// Any change to the constraints or the page size sends the listing back to
/// page 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetQuery {
    page: u32,
    limit: u32,
    constraints: Vec<(String, String)>,
}

impl DatasetQuery {
    pub const DEFAULT_LIMIT: u32 = 15;

    pub fn new(limit: u32) -> Self {
        Self {
            page: 0,
            limit,
            constraints: Vec::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn constraints(&self) -> &[(String, String)] {
        &self.constraints
    }

    /// Constraint value for `key`, `None` when unset or blank.
    pub fn constraint(&self, key: &str) -> Option<&str> {
        self.constraints
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// Set (or blank out, with `""`) the constraint for `key`.
    ///
    /// Keys keep the position of their first insertion. An unset key and a
    /// blank one are the same query. Returns whether anything changed.
    pub fn set_constraint(&mut self, key: &str, value: &str) -> bool {
        if self.constraint(key).unwrap_or("") == value {
            return false;
        }
        match self.constraints.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.constraints.push((key.to_string(), value.to_string())),
        }
        self.page = 0;
        true
    }

    pub fn clear_constraints(&mut self) -> bool {
        let had_any = self.constraints.iter().any(|(_, v)| !v.is_empty());
        self.constraints.clear();
        self.page = 0;
        had_any
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    /// Step back one page; returns false when already on the first one.
    pub fn previous_page(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.page -= 1;
        true
    }

    pub fn set_limit(&mut self, limit: u32) {
        if limit != self.limit {
            self.limit = limit;
            self.page = 0;
        }
    }

    /// Every key has a non-blank constraint.
    pub fn is_complete(&self, keys: &[Key]) -> bool {
        keys.iter().all(|k| self.constraint(&k.original).is_some())
    }

    /// Every key except `excluded` has a non-blank constraint.
    pub fn is_complete_except(&self, keys: &[Key], excluded: &str) -> bool {
        keys.iter()
            .filter(|k| k.original != excluded)
            .all(|k| self.constraint(&k.original).is_some())
    }

    /// Constraint values for `keys`, in key order; `None` if any is blank.
    pub fn values_for(&self, keys: &[Key]) -> Option<Vec<String>> {
        keys.iter()
            .map(|k| self.constraint(&k.original).map(str::to_string))
            .collect()
    }

    pub fn url(&self, host: &str) -> String {
        datasets_url(host, &self.constraints, self.limit, self.page)
    }
}

impl Default for DatasetQuery {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}
