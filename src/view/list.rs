use std::cmp::Ordering;

use crate::models::{Searchable, matches_search};
use crate::view::pagination::Pagination;

/// 列表的分类过滤条件
pub trait RecordFilter<T> {
    fn matches(&self, item: &T) -> bool;

    /// 是否有任何条件生效（用于界面提示）
    fn is_active(&self) -> bool;

    /// 当前条件的简短描述
    fn describe(&self) -> String;
}

/// 只有关键字搜索、没有分类过滤的列表
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFilter;

impl<T> RecordFilter<T> for NoFilter {
    fn matches(&self, _item: &T) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        String::new()
    }
}

/// 客户端 过滤 + 分页 视图
///
/// 数据源 → 关键字搜索（大小写不敏感）→ 分类过滤 → 分页切片。
/// 过滤结果只由数据源与当前条件决定，任一条件变化都会同步重算；
/// 搜索词、过滤条件、每页行数变化时页码回到 1。
#[derive(Debug, Clone)]
pub struct ListView<T, F> {
    source: Vec<T>,
    search: String,
    filter: F,
    pagination: Pagination,
    order: Option<fn(&T, &T) -> Ordering>,
    filtered: Vec<usize>,
}

impl<T, F> ListView<T, F>
where
    T: Searchable,
    F: RecordFilter<T>,
{
    pub fn new(source: Vec<T>, filter: F, rows_per_page: usize) -> Self {
        let mut view = Self {
            source,
            search: String::new(),
            filter,
            pagination: Pagination::new(rows_per_page),
            order: None,
            filtered: Vec::new(),
        };
        view.recompute();
        view
    }

    /// 为数据源指定固定排序（每次替换数据源时都会重新排序）
    pub fn with_order(mut self, order: fn(&T, &T) -> Ordering) -> Self {
        self.order = Some(order);
        self.source.sort_by(order);
        self.recompute();
        self
    }

    fn recompute(&mut self) {
        let term = self.search.as_str();
        let filter = &self.filter;
        self.filtered = self
            .source
            .iter()
            .enumerate()
            .filter(|(_, item)| matches_search(*item, term) && filter.matches(*item))
            .map(|(i, _)| i)
            .collect();
        let page = self.pagination.page();
        self.pagination.go_to(page, self.filtered.len());
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term == self.search {
            return;
        }
        self.search = term;
        self.pagination.reset();
        self.recompute();
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// 调整不代表用户意图的过滤参数（如时间窗口的基准时间）：重算但保留页码
    pub fn refresh_filter(&mut self, update: impl FnOnce(&mut F)) {
        update(&mut self.filter);
        self.recompute();
    }

    pub fn update_filter(&mut self, update: impl FnOnce(&mut F)) {
        update(&mut self.filter);
        self.pagination.reset();
        self.recompute();
    }

    pub fn rows_per_page(&self) -> usize {
        self.pagination.rows_per_page()
    }

    pub fn set_rows_per_page(&mut self, rows: usize) -> bool {
        self.pagination.set_rows_per_page(rows)
    }

    pub fn cycle_rows_per_page(&mut self) {
        self.pagination.cycle_rows_per_page();
    }

    pub fn page(&self) -> usize {
        self.pagination.page()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.filtered.len())
    }

    pub fn next_page(&mut self) {
        self.pagination.next(self.filtered.len());
    }

    pub fn prev_page(&mut self) {
        self.pagination.prev(self.filtered.len());
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pagination.go_to(page, self.filtered.len());
    }

    /// 当前页的记录
    pub fn rows(&self) -> Vec<&T> {
        self.filtered[self.pagination.range(self.filtered.len())]
            .iter()
            .map(|&i| &self.source[i])
            .collect()
    }

    /// 当前页第 `index` 行
    pub fn row_at(&self, index: usize) -> Option<&T> {
        let range = self.pagination.range(self.filtered.len());
        self.filtered[range].get(index).map(|&i| &self.source[i])
    }

    /// 全部过滤结果（导出使用）
    pub fn filtered(&self) -> impl Iterator<Item = &T> {
        self.filtered.iter().map(|&i| &self.source[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn source(&self) -> &[T] {
        &self.source
    }

    /// 重新拉取后替换数据源：保留搜索、过滤与当前页（超出范围时收敛到最后一页）
    pub fn replace_source(&mut self, mut items: Vec<T>) {
        if let Some(order) = self.order {
            items.sort_by(order);
        }
        self.source = items;
        self.recompute();
    }

    /// 原地修改满足条件的记录，返回修改条数
    pub fn update_where(&mut self, pred: impl Fn(&T) -> bool, mut f: impl FnMut(&mut T)) -> usize {
        let mut changed = 0;
        for item in self.source.iter_mut().filter(|item| pred(item)) {
            f(item);
            changed += 1;
        }
        if changed > 0 {
            if let Some(order) = self.order {
                self.source.sort_by(order);
            }
            self.recompute();
        }
        changed
    }

    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.source.len();
        self.source.retain(|item| !pred(item));
        let removed = before - self.source.len();
        if removed > 0 {
            self.recompute();
        }
        removed
    }

    pub fn push(&mut self, item: T) {
        self.source.push(item);
        if let Some(order) = self.order {
            self.source.sort_by(order);
        }
        self.recompute();
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<&T> {
        self.source.iter().find(|item| pred(item))
    }
}
