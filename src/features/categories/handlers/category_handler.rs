use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::categories::dtos::CategoryResponseDto;
use crate::features::categories::services::CategoryStore;

/// List active categories for the submission form
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Active categories", body = Vec<CategoryResponseDto>),
        (status = 500, description = "Internal error")
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(store): State<Arc<dyn CategoryStore>>,
) -> Result<Json<Vec<CategoryResponseDto>>> {
    let categories = store.list_active().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::models::Category;
    use crate::shared::test_helpers::{categories_test_router, InMemoryCategoryStore};
    use axum_test::TestServer;
    use serde_json::Value;

    fn category(name: &str, is_active: bool, sort_order: i32) -> Category {
        Category {
            id: sort_order,
            name: name.to_string(),
            name_hi: None,
            description: None,
            icon_class: None,
            is_active,
            sort_order,
        }
    }

    #[tokio::test]
    async fn lists_only_active_categories_in_sort_order() {
        let store = InMemoryCategoryStore::new(vec![
            category("garbage_heap", true, 8),
            category("open_manholes", false, 2),
            category("potholes", true, 1),
            category("water_leaks", true, 4),
        ]);
        let server = TestServer::new(categories_test_router(Arc::new(store))).unwrap();

        let res = server.get("/categories").await;
        res.assert_status_ok();

        let body: Value = res.json();
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["potholes", "water_leaks", "garbage_heap"]);
    }

    #[tokio::test]
    async fn ties_on_sort_order_fall_back_to_name() {
        let store = InMemoryCategoryStore::new(vec![
            category("water_leaks", true, 1),
            category("potholes", true, 1),
        ]);
        let server = TestServer::new(categories_test_router(Arc::new(store))).unwrap();

        let body: Value = server.get("/categories").await.json();
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["potholes", "water_leaks"]);
    }
}
