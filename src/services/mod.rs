use sea_orm::{EntityTrait, FromQueryResult, Order, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::errors::ServiceError;

pub mod inventory;
pub mod inventory_movements;
pub mod items;
pub mod storages;
pub mod suppliers;
pub mod transfer_in;

/// Paging parameters shared by every listing operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub page: u64,
    pub size: u64,
    pub order: String,
    pub asc: bool,
    pub keyword: Option<String>,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            order: "id".to_string(),
            asc: true,
            keyword: None,
        }
    }
}

impl Paging {
    pub fn sort_order(&self) -> Order {
        if self.asc {
            Order::Asc
        } else {
            Order::Desc
        }
    }

    /// Keyword filter, normalized: `None` when absent or blank.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// One page of a listing plus its total count.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, size: u64) -> Self {
        Self {
            items,
            total,
            page,
            size,
            total_pages: total.div_ceil(size.max(1)),
        }
    }
}

/// Runs a filtered query through the paginator, clamping page/size to sane
/// minimums.
pub(crate) async fn paginate<E>(
    db: &DbPool,
    query: Select<E>,
    paging: &Paging,
) -> Result<PagedResult<E::Model>, ServiceError>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Sized + Send + Sync,
{
    let page = paging.page.max(1);
    let size = paging.size.max(1);

    let paginator = query.paginate(db, size);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(PagedResult::new(items, total, page, size))
}

/// Falls back to the service account when the caller did not identify an
/// acting user.
pub(crate) fn actor_or_default(actor: &Option<String>) -> String {
    actor
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "system".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_match_listing_contract() {
        let paging = Paging::default();
        assert_eq!(paging.page, 1);
        assert_eq!(paging.size, 20);
        assert_eq!(paging.order, "id");
        assert!(paging.asc);
        assert!(paging.keyword.is_none());
    }

    #[test]
    fn blank_keyword_is_ignored() {
        let paging = Paging {
            keyword: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(paging.keyword(), None);
    }

    #[test]
    fn total_pages_rounds_up() {
        let result = PagedResult::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(result.total_pages, 3);
    }

    #[test]
    fn missing_actor_falls_back_to_system() {
        assert_eq!(actor_or_default(&None), "system");
        assert_eq!(actor_or_default(&Some("  ".into())), "system");
        assert_eq!(actor_or_default(&Some("clerk".into())), "clerk");
    }
}
