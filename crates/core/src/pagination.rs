//! One page of an ordered, counted sequence.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// A single page of results plus the metadata needed to navigate the rest.
///
/// Page numbers are 1-based. Construction never fails: a page past the end is
/// simply empty, and `items.len() <= page_size` always holds.
///
/// The primitive only windows and counts. Ordering is the caller's job and
/// must be stable, or consecutive pages can overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedResult<T> {
    items: Vec<T>,
    total_count: u64,
    page_number: u32,
    page_size: u32,
}

impl<T> PaginatedResult<T> {
    /// Wrap an already-windowed slice of items.
    ///
    /// Items beyond `page_size` are dropped to keep the page invariant.
    pub fn new(mut items: Vec<T>, total_count: u64, page_number: u32, page_size: u32) -> Self {
        items.truncate(page_size as usize);
        Self {
            items,
            total_count,
            page_number,
            page_size,
        }
    }

    pub fn empty(page_number: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), 0, page_number, page_size)
    }

    /// Window an ordered sequence and count it.
    pub fn from_ordered(ordered: &[T], page_number: u32, page_size: u32) -> Self
    where
        T: Clone,
    {
        let total_count = ordered.len() as u64;
        let items = match window(page_number, page_size) {
            Some((skip, take)) => ordered.iter().skip(skip).take(take).cloned().collect(),
            None => Vec::new(),
        };
        Self::new(items, total_count, page_number, page_size)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page_number) < self.total_pages()
    }

    /// Convert the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}

impl<T: Serialize> Serialize for PaginatedResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut page = serializer.serialize_struct("PaginatedResult", 7)?;
        page.serialize_field("items", &self.items)?;
        page.serialize_field("totalCount", &self.total_count)?;
        page.serialize_field("pageNumber", &self.page_number)?;
        page.serialize_field("pageSize", &self.page_size)?;
        page.serialize_field("totalPages", &self.total_pages())?;
        page.serialize_field("hasPreviousPage", &self.has_previous_page())?;
        page.serialize_field("hasNextPage", &self.has_next_page())?;
        page.end()
    }
}

/// `(skip, take)` for a 1-based page, or `None` when the page cannot hold items.
pub fn window(page_number: u32, page_size: u32) -> Option<(usize, usize)> {
    if page_number == 0 || page_size == 0 {
        return None;
    }
    let skip = (page_number as usize - 1).checked_mul(page_size as usize)?;
    Some((skip, page_size as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbers(n: u32) -> Vec<u32> {
        (1..=n).collect()
    }

    #[test]
    fn first_page_of_two() {
        let page = PaginatedResult::from_ordered(&numbers(4), 1, 2);
        assert_eq!(page.items(), &[1, 2]);
        assert_eq!(page.total_count(), 4);
        assert_eq!(page.total_pages(), 2);
        assert!(page.has_next_page());
        assert!(!page.has_previous_page());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = PaginatedResult::from_ordered(&numbers(4), 3, 2);
        assert!(page.items().is_empty());
        assert_eq!(page.total_count(), 4);
        assert!(!page.has_next_page());
        assert!(page.has_previous_page());
    }

    #[test]
    fn partial_last_page() {
        let page = PaginatedResult::from_ordered(&numbers(5), 3, 2);
        assert_eq!(page.items(), &[5]);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_next_page());
    }

    #[test]
    fn zero_page_size_yields_no_pages() {
        let page = PaginatedResult::from_ordered(&numbers(3), 1, 0);
        assert!(page.items().is_empty());
        assert_eq!(page.total_pages(), 0);
        assert!(!page.has_next_page());
    }

    #[test]
    fn new_truncates_oversized_pages() {
        let page = PaginatedResult::new(numbers(5), 5, 1, 3);
        assert_eq!(page.items(), &[1, 2, 3]);
    }

    #[test]
    fn map_keeps_metadata() {
        let page = PaginatedResult::from_ordered(&numbers(7), 2, 3).map(|n| n.to_string());
        assert_eq!(page.items(), &["4".to_string(), "5".to_string(), "6".to_string()]);
        assert_eq!(page.total_count(), 7);
        assert_eq!(page.page_number(), 2);
    }

    proptest! {
        #[test]
        fn page_invariants_hold(total in 0u32..200, page in 0u32..30, size in 0u32..40) {
            let data = numbers(total);
            let result = PaginatedResult::from_ordered(&data, page, size);

            prop_assert!(result.items().len() <= size as usize);
            prop_assert_eq!(result.total_count(), u64::from(total));
            prop_assert_eq!(result.has_previous_page(), page > 1);
            prop_assert_eq!(result.has_next_page(), u64::from(page) < result.total_pages());
            if size > 0 {
                prop_assert_eq!(result.total_pages(), u64::from(total).div_ceil(u64::from(size)));
            }
            if let Some(first) = result.items().first() {
                prop_assert_eq!(*first, (page - 1) * size + 1);
            }
        }
    }
}
