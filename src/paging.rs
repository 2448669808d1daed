use std::ops::Range;

/// Page numbers shown in the pager.
pub const PAGE_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: usize,
    pub page_size: usize,
}

impl PaginationState {
    /// Out-of-range input is clamped: pages below 1 become 1 and a
    /// non-positive page size becomes `default_page_size`.
    pub fn new(current_page: i64, page_size: i64, default_page_size: usize) -> Self {
        let current_page = if current_page < 1 {
            1
        } else {
            current_page as usize
        };
        let page_size = if page_size < 1 {
            default_page_size.max(1)
        } else {
            page_size as usize
        };
        PaginationState {
            current_page,
            page_size,
        }
    }

    pub fn first(page_size: usize) -> Self {
        PaginationState {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn total_pages(&self, count: usize) -> usize {
        total_pages(count, self.page_size)
    }

    /// Same page size, page pulled back into `1..=total_pages`.
    pub fn clamped(self, count: usize) -> Self {
        PaginationState {
            current_page: self.current_page.clamp(1, self.total_pages(count)),
            page_size: self.page_size,
        }
    }

    /// Half-open slice of the ordered rows shown on the current page.
    pub fn range(&self, count: usize) -> Range<usize> {
        let start = (self.current_page - 1)
            .saturating_mul(self.page_size)
            .min(count);
        let end = start.saturating_add(self.page_size).min(count);
        start..end
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Up to five page numbers around `current`, sliding to the ends near the
/// boundaries.
pub fn page_window(current: usize, total: usize) -> Vec<usize> {
    let total = total.max(1);
    let current = current.clamp(1, total);
    let half = PAGE_WINDOW / 2;
    let (start, end) = if total <= PAGE_WINDOW || current <= half + 1 {
        (1, total.min(PAGE_WINDOW))
    } else if current + half >= total {
        (total + 1 - PAGE_WINDOW, total)
    } else {
        (current - half, current + half)
    };
    (start..=end).collect()
}
