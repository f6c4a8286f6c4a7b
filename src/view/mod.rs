//! 客户端列表视图：搜索、分类过滤、分页，以及各域的加载状态

pub mod filters;
pub mod list;
pub mod loadable;
pub mod pagination;

pub use filters::{
    CompanyFilter, ContactFilter, NotificationFilter, PaymentFilter, SubscriptionFilter,
    TicketFilter, TimeWindow,
};
pub use list::{ListView, NoFilter, RecordFilter};
pub use loadable::Loadable;
pub use pagination::{Pagination, ROWS_PER_PAGE_OPTIONS};
