pub mod habits;
pub mod health;
pub mod logs;

pub(crate) const DEFAULT_PAGE: i64 = 1;
pub(crate) const DEFAULT_PAGE_SIZE: i64 = 50;
pub(crate) const MAX_PAGE_SIZE: i64 = 100;

/// Clamp (page, page_size) query values to sane bounds.
pub(crate) fn clamp_pagination(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}
