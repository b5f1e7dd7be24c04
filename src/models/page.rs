use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl<T> Paginated<T> {
    /// Slices an already sorted result set. Page 0 is treated as page 1 and the
    /// limit is clamped to 1..=100.
    pub fn from_sorted(items: Vec<T>, request: PageRequest) -> Self {
        let page = request.page.max(1);
        let limit = request.limit.clamp(1, MAX_LIMIT);
        let total = items.len() as u64;
        let pages = total.div_ceil(u64::from(limit)) as u32;
        let skip = (page as usize - 1).saturating_mul(limit as usize);

        let items = items.into_iter().skip(skip).take(limit as usize).collect();

        Self {
            items,
            total,
            page,
            limit,
            pages,
        }
    }
}
