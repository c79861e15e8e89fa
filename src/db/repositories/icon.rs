use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::entities::{icon_links, prelude::*};

/// Repository for the bookmark tiles on the start page.
pub struct IconRepository {
    conn: DatabaseConnection,
}

impl IconRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: icon_links::Model) -> IconLink {
        IconLink {
            id: m.id,
            account_id: m.account_id,
            label: m.label,
            image: m.image,
            sort_order: m.sort_order,
            width: m.width,
            height: m.height,
            target_url: m.target_url,
            created_at: m.created_at,
        }
    }

    pub async fn add(&self, account_id: i32, icon: NewIcon) -> Result<IconLink> {
        let active = icon_links::ActiveModel {
            account_id: Set(account_id),
            label: Set(icon.label),
            image: Set(icon.image),
            sort_order: Set(icon.sort_order),
            width: Set(icon.width),
            height: Set(icon.height),
            target_url: Set(icon.target_url),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert icon")?;

        info!("Added icon {} for account {}", model.id, account_id);
        Ok(Self::map_model(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<IconLink>> {
        let result = IconLinks::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query icon by ID")?;

        Ok(result.map(Self::map_model))
    }

    /// Icons for one account, ordered by position. Equal positions keep
    /// insertion order via the id tie-break.
    pub async fn list_by_owner(&self, account_id: i32) -> Result<Vec<IconLink>> {
        let rows = IconLinks::find()
            .filter(icon_links::Column::AccountId.eq(account_id))
            .order_by_asc(icon_links::Column::SortOrder)
            .order_by_asc(icon_links::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list icons")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = IconLinks::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete icon")?;

        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct IconLink {
    pub id: i32,
    pub account_id: i32,
    pub label: String,
    pub image: String,
    pub sort_order: i32,
    pub width: i32,
    pub height: i32,
    pub target_url: String,
    pub created_at: String,
}

/// Fields of an icon about to be created. The target URL is expected to be
/// normalized already; it is stored verbatim.
#[derive(Debug, Clone)]
pub struct NewIcon {
    pub label: String,
    pub image: String,
    pub sort_order: i32,
    pub width: i32,
    pub height: i32,
    pub target_url: String,
}
