//! Fixed-size client-side pagination.

/// Distance from the current page that stays visible in the page strip.
pub const PAGE_STRIP_DELTA: usize = 3;

/// One page of a list plus where it sits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageView<T> {
    pub items: Vec<T>,
    /// 1-based page actually shown, after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Number of pages for `len` rows, never less than one.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Slice out `page` (1-based, clamped into range) of `items`.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> PageView<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    PageView {
        items: items.iter().skip(start).take(page_size).cloned().collect(),
        page,
        total_pages,
        total_items: items.len(),
    }
}

/// Entry of the page-number strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Gap,
}

/// Page numbers to show: first, last, and [`PAGE_STRIP_DELTA`] around `current`,
/// with a [`PageItem::Gap`] wherever numbers are skipped.
pub fn page_strip(current: usize, total_pages: usize) -> Vec<PageItem> {
    let total_pages = total_pages.max(1);
    let current = current.clamp(1, total_pages);
    let low = current.saturating_sub(PAGE_STRIP_DELTA).max(1);
    let high = (current + PAGE_STRIP_DELTA).min(total_pages);

    let mut pages: Vec<usize> = (low..=high).collect();
    pages.push(1);
    pages.push(total_pages);
    pages.sort_unstable();
    pages.dedup();

    let mut items = Vec::with_capacity(pages.len() + 2);
    let mut previous: Option<usize> = None;
    for page in pages {
        if previous.is_some_and(|prev| page - prev > 1) {
            items.push(PageItem::Gap);
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}

/// Pager that shows every open row on the first page followed by a few done
/// rows, and only done rows afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenDonePager {
    /// Done rows appended to the first page.
    pub first_page_done: usize,
    /// Done rows per later page.
    pub page_size: usize,
}

impl Default for OpenDonePager {
    fn default() -> Self {
        Self {
            first_page_done: 10,
            page_size: 20,
        }
    }
}

impl OpenDonePager {
    pub fn total_pages(&self, done_len: usize) -> usize {
        let remainder = done_len.saturating_sub(self.first_page_done);
        1 + remainder.div_ceil(self.page_size.max(1))
    }

    /// Rows on `page` (1-based). Pages past the end are empty.
    pub fn page<T: Clone>(&self, open: &[T], done: &[T], page: usize) -> Vec<T> {
        if page <= 1 {
            return open
                .iter()
                .chain(done.iter().take(self.first_page_done))
                .cloned()
                .collect();
        }
        let page_size = self.page_size.max(1);
        let start = self.first_page_done + (page - 2) * page_size;
        done.iter().skip(start).take(page_size).cloned().collect()
    }

    /// Split rows by `is_done`, keeping their order.
    pub fn split<T: Clone>(rows: &[T], is_done: impl Fn(&T) -> bool) -> (Vec<T>, Vec<T>) {
        rows.iter().cloned().partition(|row| !is_done(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_requested_page() {
        let rows: Vec<u32> = (1..=17).collect();
        let view = paginate(&rows, 9, 8);
        assert_eq!(view.page, 3);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.items, vec![17]);
        assert_eq!(paginate(&rows, 0, 8).items, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn empty_list_has_one_page() {
        let view = paginate::<u32>(&[], 1, 8);
        assert_eq!(view.total_pages, 1);
        assert!(view.items.is_empty());
    }

    #[test]
    fn strip_marks_gaps() {
        use PageItem::{Gap, Page};
        assert_eq!(
            page_strip(10, 20),
            vec![Page(1), Gap, Page(7), Page(8), Page(9), Page(10), Page(11), Page(12), Page(13), Gap, Page(20)]
        );
        assert_eq!(page_strip(1, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(page_strip(2, 6), vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6)]);
        assert_eq!(page_strip(1, 1), vec![Page(1)]);
    }

    #[test]
    fn open_done_pager_layout() {
        let pager = OpenDonePager::default();
        let open = vec!["o1", "o2"];
        let done: Vec<String> = (0..35).map(|idx| format!("d{idx}")).collect();
        let done: Vec<&str> = done.iter().map(String::as_str).collect();
        assert_eq!(pager.total_pages(done.len()), 3);
        let first = pager.page(&open, &done, 1);
        assert_eq!(first.len(), 12);
        assert_eq!(first[2], "d0");
        let second = pager.page(&open, &done, 2);
        assert_eq!(second.first(), Some(&"d10"));
        assert_eq!(second.len(), 20);
        assert_eq!(pager.page(&open, &done, 3), vec!["d30", "d31", "d32", "d33", "d34"]);
        assert!(pager.page(&open, &done, 4).is_empty());
        assert_eq!(pager.total_pages(4), 1);
    }

    #[test]
    fn split_keeps_order() {
        let rows = vec![(1, false), (2, true), (3, false)];
        let (open, done) = OpenDonePager::split(&rows, |row| row.1);
        assert_eq!(open, vec![(1, false), (3, false)]);
        assert_eq!(done, vec![(2, true)]);
    }
}
