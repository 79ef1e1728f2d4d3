//! List controller
//!
//! Holds the state behind every list screen (loaded items, search keyword,
//! 1-based current page, page size, sort column) and derives the visible
//! rows. Client-strategy resources filter and slice locally; server-strategy
//! resources hold exactly one backend page and translate the UI page into a
//! 0-based search query.
//!
//! Responses are applied through `RequestTicket`s so a slow, superseded
//! search cannot overwrite a newer one.

pub mod debounce;
pub mod sort;

pub use debounce::Debouncer;
pub use sort::{SortDirection, SortState};

use tracing::debug;

use crate::model::{display_value, Page, Record, RecordId, SearchQuery};
use crate::resources::ListStrategy;

/// Handle for one in-flight load. Only the newest ticket may apply results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    seq: u64,
}

impl RequestTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Why the list shows no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing exists yet: offer "Add first record".
    NoRecords,
    /// Records exist but none match the keyword.
    NoMatches,
}

/// Search/sort/paginate state for one resource list.
#[derive(Debug, Clone)]
pub struct ListController {
    items: Vec<Record>,
    search_term: String,
    current_page: usize,
    items_per_page: usize,
    sort: Option<SortState>,
    strategy: ListStrategy,
    /// Server strategy only: total matches across all pages.
    total_elements: u64,
    seq: u64,
}

impl ListController {
    pub fn new(strategy: ListStrategy, items_per_page: usize) -> Self {
        Self {
            items: Vec::new(),
            search_term: String::new(),
            current_page: 1,
            items_per_page: items_per_page.max(1),
            sort: None,
            strategy,
            total_elements: 0,
            seq: 0,
        }
    }

    pub fn strategy(&self) -> ListStrategy {
        self.strategy
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Replace the loaded items (client strategy, or a fresh server page).
    pub fn set_items(&mut self, items: Vec<Record>) {
        self.items = items;
        if self.strategy == ListStrategy::Client {
            self.total_elements = self.items.len() as u64;
        }
        self.clamp_page();
    }

    /// Change the keyword; always returns to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
    }

    pub fn set_items_per_page(&mut self, size: usize) {
        self.items_per_page = size.max(1);
        self.current_page = 1;
    }

    /// Column header click: a new column sorts ascending, the same column
    /// flips direction.
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = Some(match self.sort.take() {
            Some(current) if current.key == key => SortState {
                key: current.key,
                direction: current.direction.toggled(),
            },
            _ => SortState::ascending(key),
        });
    }

    /// Rows matching the keyword, in load order.
    pub fn filtered(&self) -> Vec<Record> {
        match self.strategy {
            ListStrategy::Server => self.items.clone(),
            ListStrategy::Client => {
                let needle = self.search_term.trim().to_lowercase();
                self.items
                    .iter()
                    .filter(|r| needle.is_empty() || record_matches(r, &needle))
                    .cloned()
                    .collect()
            }
        }
    }

    /// Rows to render on the current page.
    pub fn visible(&self) -> Vec<Record> {
        let mut rows = self.filtered();
        if let Some(sort) = &self.sort {
            sort::sort_records(&mut rows, sort);
        }
        match self.strategy {
            ListStrategy::Server => rows,
            ListStrategy::Client => {
                let (start, end) = self.bounds(rows.len());
                rows.drain(start..end).collect()
            }
        }
    }

    /// Slice bounds for the current page, clamped to `len`.
    fn bounds(&self, len: usize) -> (usize, usize) {
        let start = (self.current_page - 1)
            .saturating_mul(self.items_per_page)
            .min(len);
        let end = start.saturating_add(self.items_per_page).min(len);
        (start, end)
    }

    /// Matches across all pages.
    pub fn total_count(&self) -> u64 {
        match self.strategy {
            ListStrategy::Client => self.filtered().len() as u64,
            ListStrategy::Server => self.total_elements,
        }
    }

    /// Page count, never less than one.
    pub fn total_pages(&self) -> usize {
        let total = self.total_count() as usize;
        total.div_ceil(self.items_per_page).max(1)
    }

    /// 1-based inclusive range of rows shown, with the total, e.g. `(11, 20, 42)`.
    pub fn range(&self) -> (usize, usize, u64) {
        let total = self.total_count();
        if total == 0 {
            return (0, 0, 0);
        }
        let start = (self.current_page - 1) * self.items_per_page + 1;
        let end = start + self.visible().len() - 1;
        (start, end, total)
    }

    /// Move to page `n`, clamped to the valid range.
    pub fn go_to_page(&mut self, n: usize) {
        self.current_page = n.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    /// Move to a page the server has not reported yet (server strategy
    /// navigation happens before the new page is loaded).
    pub fn request_page(&mut self, n: usize) {
        self.current_page = n.max(1);
    }

    fn clamp_page(&mut self) {
        let last = self.total_pages();
        if self.current_page > last {
            self.current_page = last;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.visible().is_empty()
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.is_empty() {
            return None;
        }
        let has_keyword = !self.search_term.trim().is_empty();
        let has_rows = match self.strategy {
            ListStrategy::Client => !self.items.is_empty(),
            ListStrategy::Server => true,
        };
        if has_keyword && has_rows {
            Some(EmptyState::NoMatches)
        } else {
            Some(EmptyState::NoRecords)
        }
    }

    /// Search query for the current state (server strategy).
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::new(
            self.search_term.trim(),
            (self.current_page - 1) as u64,
            self.items_per_page as u64,
        )
    }

    /// Start a load; any earlier ticket becomes stale.
    pub fn begin_request(&mut self) -> RequestTicket {
        self.seq += 1;
        RequestTicket { seq: self.seq }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.seq == self.seq
    }

    /// Apply a full list load. Returns false if the ticket was superseded.
    pub fn apply_items(&mut self, ticket: RequestTicket, items: Vec<Record>) -> bool {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.seq, "dropping stale list response");
            return false;
        }
        self.set_items(items);
        true
    }

    /// Apply one server page. Returns false if the ticket was superseded.
    pub fn apply_page(&mut self, ticket: RequestTicket, page: Page<Record>) -> bool {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.seq, "dropping stale search response");
            return false;
        }
        self.total_elements = page.total_elements;
        self.items = page.content;
        self.items.truncate(self.items_per_page);
        true
    }

    /// Add a record the backend just created. A row already holding the
    /// same id is replaced instead of duplicated.
    pub fn insert(&mut self, record: Record) {
        if self.replace(record.clone()) {
            return;
        }
        match self.strategy {
            ListStrategy::Client => {
                self.items.push(record);
                self.total_elements = self.items.len() as u64;
            }
            ListStrategy::Server => {
                if self.items.len() < self.items_per_page {
                    self.items.push(record);
                }
                self.total_elements += 1;
            }
        }
    }

    /// Patch an updated record into the row with the same id. Totals never
    /// change; a record that is not loaded is left alone. Returns whether a
    /// row was replaced.
    pub fn replace(&mut self, record: Record) -> bool {
        let Some(id) = record.persisted_id() else {
            return false;
        };
        match self.items.iter_mut().find(|r| r.persisted_id() == Some(id)) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Remove a row after a successful delete. If the current page no longer
    /// exists it steps back exactly one page. Returns whether a row was removed.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.persisted_id() != Some(id));
        let removed = self.items.len() != before;
        if removed {
            self.total_elements = self.total_elements.saturating_sub(1);
            if self.strategy == ListStrategy::Client {
                self.total_elements = self.items.len() as u64;
            }
            if self.current_page > self.total_pages() {
                self.current_page = self.current_page.saturating_sub(1).max(1);
            }
        }
        removed
    }

    /// Drop everything after a clear-all.
    pub fn clear_items(&mut self) {
        self.items.clear();
        self.total_elements = 0;
        self.current_page = 1;
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.items.iter().find(|r| r.persisted_id() == Some(id))
    }
}

fn record_matches(record: &Record, needle: &str) -> bool {
    let id_hit = record
        .persisted_id()
        .is_some_and(|id| id.to_string() == needle);
    id_hit
        || record
            .fields
            .values()
            .any(|v| display_value(v).to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(n: i64) -> Vec<Record> {
        (1..=n)
            .map(|i| Record::new().with_id(i).with("tag", format!("tag-{:02}", i)))
            .collect()
    }

    fn client(items: Vec<Record>, per_page: usize) -> ListController {
        let mut list = ListController::new(ListStrategy::Client, per_page);
        list.set_items(items);
        list
    }

    fn ids(rows: &[Record]) -> Vec<i64> {
        rows.iter().filter_map(|r| r.id).collect()
    }

    #[test]
    fn test_keyword_matching_nothing_is_empty() {
        let mut list = client(tags(5), 10);
        list.set_search("zzz-not-there");
        assert!(list.visible().is_empty());
        assert!(list.is_empty());
        assert_eq!(list.empty_state(), Some(EmptyState::NoMatches));
        assert_eq!(list.total_pages(), 1);
    }

    #[test]
    fn test_nothing_loaded_offers_first_record() {
        let list = ListController::new(ListStrategy::Client, 10);
        assert_eq!(list.empty_state(), Some(EmptyState::NoRecords));
        assert_eq!(list.range(), (0, 0, 0));
    }

    #[test]
    fn test_search_is_case_insensitive_and_resets_page() {
        let mut list = client(tags(25), 10);
        list.go_to_page(3);
        list.set_search("TAG-1");
        assert_eq!(list.current_page(), 1);
        assert_eq!(ids(&list.visible()), (10..=19).collect::<Vec<_>>());
        assert_eq!(list.total_count(), 10);
    }

    #[test]
    fn test_toggle_sort_alternates_and_round_trips() {
        let items = vec![
            Record::new().with_id(1).with("status", "open"),
            Record::new().with_id(2).with("status", "closed"),
            Record::new().with_id(3).with("status", "open"),
            Record::new().with_id(4).with("status", "closed"),
        ];
        let mut list = client(items, 10);

        list.toggle_sort("status");
        assert_eq!(list.sort().unwrap().direction, SortDirection::Ascending);
        assert_eq!(ids(&list.visible()), vec![2, 4, 1, 3]);

        list.toggle_sort("status");
        assert_eq!(list.sort().unwrap().direction, SortDirection::Descending);
        assert_eq!(ids(&list.visible()), vec![1, 3, 2, 4]);

        list.toggle_sort("status");
        assert_eq!(list.sort().unwrap().direction, SortDirection::Ascending);
        assert_eq!(ids(&list.visible()), vec![2, 4, 1, 3]);

        list.toggle_sort("id");
        assert_eq!(list.sort(), Some(&SortState::ascending("id")));
    }

    #[test]
    fn test_slices_never_out_of_bounds() {
        for total in 0..12 {
            for per_page in 1..6 {
                let mut list = client(tags(total), per_page);
                for page in 0..(total as usize + 3) {
                    list.go_to_page(page);
                    let visible = list.visible();
                    assert!(visible.len() <= per_page);
                    assert!(list.current_page() >= 1);
                    assert!(list.current_page() <= list.total_pages());
                }
            }
        }
    }

    #[test]
    fn test_deleting_last_item_on_last_page_steps_back_one() {
        let mut list = client(tags(21), 10);
        list.go_to_page(3);
        assert_eq!(ids(&list.visible()), vec![21]);

        assert!(list.remove(21));
        assert_eq!(list.current_page(), 2);
        assert_eq!(list.visible().len(), 10);

        // deleting elsewhere keeps the page
        assert!(list.remove(1));
        assert_eq!(list.current_page(), 2);
        assert!(!list.remove(999));
    }

    #[test]
    fn test_next_and_prev_stop_at_the_ends() {
        let mut list = client(tags(23), 10);
        list.prev_page();
        assert_eq!(list.current_page(), 1);

        list.next_page();
        list.next_page();
        assert_eq!(list.current_page(), 3);
        list.next_page();
        assert_eq!(list.current_page(), 3);
        assert_eq!(ids(&list.visible()), vec![21, 22, 23]);

        list.prev_page();
        assert_eq!(list.current_page(), 2);
        list.prev_page();
        list.prev_page();
        assert_eq!(list.current_page(), 1);

        let mut empty = ListController::new(ListStrategy::Client, 10);
        empty.next_page();
        assert_eq!(empty.current_page(), 1);
    }

    #[test]
    fn test_insert_appends_and_replace_patches() {
        let mut list = client(tags(2), 10);
        assert!(list.replace(Record::new().with_id(2).with("tag", "renamed")));
        assert_eq!(list.get(2).unwrap().str_field("tag"), Some("renamed"));
        list.insert(Record::new().with_id(3).with("tag", "new"));
        assert_eq!(list.items().len(), 3);
        assert_eq!(list.total_count(), 3);
    }

    #[test]
    fn test_replacing_an_unloaded_record_keeps_totals() {
        let mut list = ListController::new(ListStrategy::Server, 5);
        let ticket = list.begin_request();
        list.apply_page(ticket, Page::new(tags(5), 12, 0, 5));

        assert!(!list.replace(Record::new().with_id(12).with("tag", "far away")));
        assert_eq!(list.total_count(), 12);
        assert_eq!(list.items().len(), 5);
        assert_eq!(list.total_pages(), 3);

        list.insert(Record::new().with_id(13).with("tag", "fresh"));
        assert_eq!(list.total_count(), 13);
        assert_eq!(list.items().len(), 5);
    }

    #[test]
    fn test_server_query_is_zero_based() {
        let mut list = ListController::new(ListStrategy::Server, 5);
        list.set_search("USD");
        assert_eq!(list.search_query(), SearchQuery::new("USD", 0, 5));
        list.request_page(3);
        assert_eq!(list.search_query().page, 2);
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut list = ListController::new(ListStrategy::Server, 5);
        let slow = list.begin_request();
        let fast = list.begin_request();

        let newer = Page::new(tags(2), 2, 0, 5);
        assert!(list.apply_page(fast, newer));
        let older = Page::new(tags(5), 40, 0, 5);
        assert!(!list.apply_page(slow, older));

        assert_eq!(list.items().len(), 2);
        assert_eq!(list.total_pages(), 1);
    }

    #[test]
    fn test_server_page_capped_and_pages_from_total() {
        let mut list = ListController::new(ListStrategy::Server, 5);
        let ticket = list.begin_request();
        assert!(list.apply_page(ticket, Page::new(tags(7), 23, 0, 5)));
        assert_eq!(list.visible().len(), 5);
        assert_eq!(list.total_pages(), 5);
        assert_eq!(list.range(), (1, 5, 23));
    }

    #[test]
    fn test_clear_items_resets() {
        let mut list = client(tags(30), 10);
        list.go_to_page(3);
        list.clear_items();
        assert_eq!(list.current_page(), 1);
        assert_eq!(list.empty_state(), Some(EmptyState::NoRecords));
    }
}
