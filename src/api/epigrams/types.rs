use crate::models::epigram::{Epigram, EpigramPage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub current_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub count: Option<i64>,
    pub current_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Body for both create and update.
#[derive(Debug, Deserialize, Serialize)]
pub struct EpigramRequest {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedEpigrams {
    pub items: Vec<Epigram>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl From<EpigramPage> for PaginatedEpigrams {
    fn from(page: EpigramPage) -> Self {
        let pages = page.pages();
        PaginatedEpigrams {
            has_next: page.page < pages,
            has_prev: page.page > 1,
            pages,
            total: page.total,
            page: page.page,
            size: page.size,
            items: page.items,
        }
    }
}
