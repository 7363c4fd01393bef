use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::categories::models::Category;

/// Response DTO for a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_hi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_class: Option<String>,
    pub sort_order: i32,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            name_hi: c.name_hi,
            description: c.description,
            icon_class: c.icon_class,
            sort_order: c.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dto_drops_the_active_flag() {
        let dto: CategoryResponseDto = Category {
            id: 1,
            name: "potholes".to_string(),
            name_hi: None,
            description: Some("Potholes or damaged road surface".to_string()),
            icon_class: None,
            is_active: true,
            sort_order: 1,
        }
        .into();

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["name"], "potholes");
        assert!(json.get("is_active").is_none());
        assert!(json.get("name_hi").is_none());
    }
}
