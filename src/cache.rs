//! Short-lived cache of contact list pages.
//!
//! The application owns one `QueryCache` and hands it to whatever needs it;
//! mutations call [`QueryCache::invalidate_all`] explicitly.

use std::time::Duration;

use moka::sync::Cache;

use crate::model::ContactPage;
use crate::query::ContactQuery;

const MAX_PAGES: u64 = 64;

pub struct QueryCache {
    pages: Cache<ContactQuery, ContactPage>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: Cache::builder()
                .max_capacity(MAX_PAGES)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, query: &ContactQuery) -> Option<ContactPage> {
        self.pages.get(query)
    }

    pub fn store(&self, query: ContactQuery, page: ContactPage) {
        self.pages.insert(query, page);
    }

    pub fn invalidate_all(&self) {
        self.pages.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{fixtures, Pagination};
    use std::thread;

    fn query(page: u32) -> ContactQuery {
        ContactQuery {
            search: None,
            status: None,
            contact_type: None,
            page,
            limit: 10,
        }
    }

    fn page_of(n: usize) -> ContactPage {
        ContactPage {
            contacts: (0..n)
                .map(|i| fixtures::contact(&format!("c{}", i), "X"))
                .collect(),
            pagination: Pagination {
                total: n as u64,
                total_pages: 1,
            },
        }
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = QueryCache::new(Duration::from_millis(100));
        cache.store(query(1), page_of(3));
        assert_eq!(cache.get(&query(1)).map(|p| p.contacts.len()), Some(3));
        assert!(cache.get(&query(2)).is_none());

        thread::sleep(Duration::from_millis(250));
        assert!(cache.get(&query(1)).is_none());
    }

    #[test]
    fn test_queries_are_cached_separately() {
        let cache = QueryCache::new(Duration::from_secs(30));
        cache.store(query(1), page_of(1));
        cache.store(query(2), page_of(2));
        let mut searched = query(1);
        searched.search = Some("ada".into());
        assert!(cache.get(&searched).is_none());
        assert_eq!(cache.get(&query(2)).map(|p| p.contacts.len()), Some(2));
    }

    #[test]
    fn test_invalidate_all() {
        let cache = QueryCache::new(Duration::from_secs(30));
        cache.store(query(1), page_of(2));
        cache.store(query(2), page_of(2));
        cache.invalidate_all();
        assert!(cache.get(&query(1)).is_none());
        assert!(cache.get(&query(2)).is_none());
    }
}
