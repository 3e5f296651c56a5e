//! Fixed-size pagination over an ordered result.

/// Records shown per page.
pub const PAGE_SIZE: usize = 48;

/// One page of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// 1-based page number after clamping.
    pub number: usize,
    pub total_pages: usize,
    /// Size of the whole result set.
    pub total_items: usize,
    /// Offset of the first item on this page.
    pub start: usize,
    pub items: &'a [T],
}

impl<T> Page<'_, T> {
    /// 1-based offset of the last item shown; 0 for an empty result.
    pub fn end(&self) -> usize {
        self.start + self.items.len()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// `ceil(count / PAGE_SIZE)`, never less than 1.
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// Slice out page `requested`, clamped into `[1, total_pages]`.
pub fn paginate<T>(items: &[T], requested: usize) -> Page<'_, T> {
    let total_pages = total_pages(items.len());
    let number = requested.clamp(1, total_pages);
    let start = ((number - 1) * PAGE_SIZE).min(items.len());
    let end = (start + PAGE_SIZE).min(items.len());
    Page {
        number,
        total_pages,
        total_items: items.len(),
        start,
        items: &items[start..end],
    }
}
