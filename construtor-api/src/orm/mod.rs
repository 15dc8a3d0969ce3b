pub mod attachment;
pub mod checklist;
mod db;
pub mod entity_activity;
pub mod equipamento;
pub mod equipe;
pub mod expense;
pub mod login;
pub mod logout;
pub mod obra;
pub mod org;
pub mod rate_limit;
pub mod rdo;
pub mod rdo_item;
pub mod role;
pub mod testing;
pub mod user;
pub mod user_role;

pub use db::*;

/// Default and upper bound for `limit` on list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 500;

/// A window into an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Applies the default size, caps the size, and floors negatives.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Page {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(Page::new(None, None), Page { limit: 100, offset: 0 });
        assert_eq!(Page::new(Some(10_000), Some(-5)), Page { limit: 500, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(20)), Page { limit: 1, offset: 20 });
    }
}
