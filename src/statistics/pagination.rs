use serde::Serialize;

pub const DATA_TABLE_PAGE_SIZE: i64 = 25;
pub const ROLLUP_PAGE_SIZE: i64 = 10;
pub const UPLOAD_LOG_PAGE_SIZE: i64 = 25;

/// Position of one page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub number: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PageInfo {
    /// A missing or non-numeric page gives the first page; a number outside
    /// `1..=total_pages` gives the last page. An empty set still has one page.
    pub fn resolve(requested: Option<&str>, total_items: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let total_items = total_items.max(0);
        let total_pages = ((total_items + per_page - 1) / per_page).max(1);

        let number = match requested.map(str::trim).and_then(|p| p.parse::<i64>().ok()) {
            None => 1,
            Some(n) if n < 1 || n > total_pages => total_pages,
            Some(n) => n,
        };

        Self {
            number,
            per_page,
            total_items,
            total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}

/// Paginates rows that were already grouped in memory.
pub fn paginate_vec<T>(rows: Vec<T>, requested: Option<&str>, per_page: i64) -> Page<T> {
    let info = PageInfo::resolve(requested, rows.len() as i64, per_page);
    let items = rows
        .into_iter()
        .skip(info.offset() as usize)
        .take(info.per_page as usize)
        .collect();
    Page { items, info }
}
