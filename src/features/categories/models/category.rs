use sqlx::FromRow;

/// Database model for a report category. Administered out of band; the
/// report path only reads it.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub name_hi: Option<String>,
    pub description: Option<String>,
    pub icon_class: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}
