/// 可选的每页行数
pub const ROWS_PER_PAGE_OPTIONS: [usize; 5] = [5, 10, 25, 50, 100];

/// 分页状态，页码从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    rows_per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            rows_per_page: 10,
        }
    }
}

impl Pagination {
    pub fn new(rows_per_page: usize) -> Self {
        let rows_per_page = if ROWS_PER_PAGE_OPTIONS.contains(&rows_per_page) {
            rows_per_page
        } else {
            10
        };
        Self {
            page: 1,
            rows_per_page,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// ceil(count / rows_per_page)；空列表为 0
    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.rows_per_page)
    }

    /// 修改每页行数并回到第一页；不在可选范围内的值被拒绝
    pub fn set_rows_per_page(&mut self, rows: usize) -> bool {
        if !ROWS_PER_PAGE_OPTIONS.contains(&rows) {
            return false;
        }
        self.rows_per_page = rows;
        self.page = 1;
        true
    }

    /// 循环切换到下一个每页行数选项
    pub fn cycle_rows_per_page(&mut self) {
        let idx = ROWS_PER_PAGE_OPTIONS
            .iter()
            .position(|&r| r == self.rows_per_page)
            .unwrap_or(0);
        let next = ROWS_PER_PAGE_OPTIONS[(idx + 1) % ROWS_PER_PAGE_OPTIONS.len()];
        self.set_rows_per_page(next);
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// 跳转到指定页，结果限制在 1..=max(1, total_pages)
    pub fn go_to(&mut self, page: usize, count: usize) {
        let last = self.total_pages(count).max(1);
        self.page = page.clamp(1, last);
    }

    pub fn next(&mut self, count: usize) {
        self.go_to(self.page + 1, count);
    }

    pub fn prev(&mut self, count: usize) {
        self.go_to(self.page.saturating_sub(1), count);
    }

    /// 当前页在过滤结果中的下标区间
    pub fn range(&self, count: usize) -> std::ops::Range<usize> {
        let start = (self.page - 1) * self.rows_per_page;
        if start >= count {
            return count..count;
        }
        start..(start + self.rows_per_page).min(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_rows_split_into_two_pages() {
        let mut p = Pagination::new(10);
        assert_eq!(p.total_pages(12), 2);
        assert_eq!(p.range(12), 0..10);
        p.next(12);
        assert_eq!(p.page(), 2);
        assert_eq!(p.range(12), 10..12);
        p.next(12);
        assert_eq!(p.page(), 2);
    }

    #[test]
    fn rows_per_page_change_resets_page() {
        let mut p = Pagination::new(5);
        p.go_to(3, 40);
        assert_eq!(p.page(), 3);
        assert!(p.set_rows_per_page(25));
        assert_eq!(p.page(), 1);
        assert!(!p.set_rows_per_page(7));
        assert_eq!(p.rows_per_page(), 25);
    }

    #[test]
    fn go_to_clamps_into_valid_range() {
        let mut p = Pagination::new(10);
        p.go_to(99, 31);
        assert_eq!(p.page(), 4);
        p.go_to(0, 31);
        assert_eq!(p.page(), 1);
        p.go_to(5, 0);
        assert_eq!(p.page(), 1);
        assert_eq!(p.range(0), 0..0);
    }

    #[test]
    fn cycling_wraps_around_options() {
        let mut p = Pagination::new(100);
        p.cycle_rows_per_page();
        assert_eq!(p.rows_per_page(), 5);
    }
}
