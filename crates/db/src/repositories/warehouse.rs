//! Warehouse repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::registry::{Availability, WarehouseInfo, normalize_code, normalize_name};
use tally_core::{EntityKind, LedgerError, LedgerResult};
use tally_shared::types::WarehouseId;
use tracing::info;

use super::account::trim_optional;
use super::{db_err, write_err};
use crate::entities::{self, inventory_transactions, warehouses};

/// Input for creating a warehouse.
#[derive(Debug, Clone)]
pub struct CreateWarehouseInput {
    /// Warehouse code (unique).
    pub code: String,
    /// Warehouse name.
    pub name: String,
    /// Free-text location.
    pub location: Option<String>,
    /// Whether the warehouse is active.
    pub is_active: bool,
}

/// Input for updating a warehouse. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateWarehouseInput {
    /// Warehouse code.
    pub code: Option<String>,
    /// Warehouse name.
    pub name: Option<String>,
    /// Location.
    pub location: Option<Option<String>>,
    /// Whether the warehouse is active.
    pub is_active: Option<bool>,
}

/// Filter options for listing warehouses.
#[derive(Debug, Clone, Default)]
pub struct WarehouseFilter {
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// Validation view of a stored warehouse.
#[must_use]
pub fn warehouse_info(model: &warehouses::Model) -> WarehouseInfo {
    WarehouseInfo {
        id: model.id.into(),
        availability: Availability::new(model.is_active, model.deleted_at.is_some()),
    }
}

/// Warehouse repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct WarehouseRepository {
    db: DatabaseConnection,
}

impl WarehouseRepository {
    /// Creates a new warehouse repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new warehouse.
    ///
    /// # Errors
    ///
    /// `InvalidField` for malformed fields, `DuplicateCode` if the code is taken.
    pub async fn create_warehouse(&self, input: CreateWarehouseInput) -> LedgerResult<warehouses::Model> {
        let code = normalize_code("code", &input.code)?;
        let name = normalize_name("name", &input.name)?;
        ensure_code_free(&self.db, &code, None).await?;

        let warehouse = warehouses::ActiveModel {
            id: Set(WarehouseId::new().into_inner()),
            code: Set(code.clone()),
            name: Set(name),
            location: Set(trim_optional(input.location)),
            is_active: Set(input.is_active),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(write_err(EntityKind::Warehouse, &code))?;

        info!(warehouse_id = %warehouse.id, code = %warehouse.code, "Warehouse created");
        Ok(warehouse)
    }

    /// Finds a visible (not soft-deleted) warehouse.
    ///
    /// # Errors
    ///
    /// `NotFound` if the warehouse does not exist or is soft-deleted.
    pub async fn get_warehouse(&self, id: WarehouseId) -> LedgerResult<warehouses::Model> {
        find_visible(&self.db, id).await
    }

    /// Lists visible warehouses ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_warehouses(&self, filter: WarehouseFilter) -> LedgerResult<Vec<warehouses::Model>> {
        let mut query = warehouses::Entity::find()
            .filter(warehouses::Column::DeletedAt.is_null())
            .order_by_asc(warehouses::Column::Code);
        if let Some(is_active) = filter.is_active {
            query = query.filter(warehouses::Column::IsActive.eq(is_active));
        }
        query.all(&self.db).await.map_err(db_err)
    }

    /// Updates a warehouse.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidField` or `DuplicateCode`.
    pub async fn update_warehouse(
        &self,
        id: WarehouseId,
        input: UpdateWarehouseInput,
    ) -> LedgerResult<warehouses::Model> {
        let warehouse = find_visible(&self.db, id).await?;

        let code = input.code.as_deref().map(|c| normalize_code("code", c)).transpose()?;
        if let Some(code) = &code
            && *code != warehouse.code
        {
            ensure_code_free(&self.db, code, Some(id)).await?;
        }
        let name = input.name.as_deref().map(|n| normalize_name("name", n)).transpose()?;

        let mut active: warehouses::ActiveModel = warehouse.into();
        if let Some(code) = code.clone() {
            active.code = Set(code);
        }
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(location) = input.location {
            active.location = Set(trim_optional(location));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(write_err(EntityKind::Warehouse, code.as_deref().unwrap_or_default()))?;

        info!(warehouse_id = %updated.id, "Warehouse updated");
        Ok(updated)
    }

    /// Deactivates a warehouse; new movements into or out of it are rejected.
    ///
    /// # Errors
    ///
    /// `NotFound` if the warehouse does not exist or is soft-deleted.
    pub async fn deactivate_warehouse(&self, id: WarehouseId) -> LedgerResult<warehouses::Model> {
        let warehouse = find_visible(&self.db, id).await?;
        let mut active: warehouses::ActiveModel = warehouse.into();
        active.is_active = Set(false);
        let updated = active.update(&self.db).await.map_err(db_err)?;

        info!(warehouse_id = %updated.id, "Warehouse deactivated");
        Ok(updated)
    }

    /// Soft-deletes a warehouse.
    ///
    /// # Errors
    ///
    /// `NotFound` if the warehouse does not exist or is already soft-deleted.
    pub async fn delete_warehouse(&self, id: WarehouseId) -> LedgerResult<()> {
        let warehouse = find_visible(&self.db, id).await?;
        let mut active: warehouses::ActiveModel = warehouse.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(entities::now()));
        active.update(&self.db).await.map_err(db_err)?;

        info!(warehouse_id = %id, "Warehouse soft-deleted");
        Ok(())
    }

    /// Hard-deletes a warehouse without inventory history.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `StillReferenced` if any inventory transaction exists.
    pub async fn purge_warehouse(&self, id: WarehouseId) -> LedgerResult<()> {
        warehouses::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Warehouse, id))?;

        let references = inventory_transactions::Entity::find()
            .filter(inventory_transactions::Column::WarehouseId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        if references > 0 {
            return Err(LedgerError::StillReferenced {
                kind: EntityKind::Warehouse,
                id: id.into_inner(),
                references,
            });
        }

        warehouses::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        info!(warehouse_id = %id, "Warehouse purged");
        Ok(())
    }
}

pub(crate) async fn find_visible<C: ConnectionTrait>(conn: &C, id: WarehouseId) -> LedgerResult<warehouses::Model> {
    warehouses::Entity::find_by_id(id.into_inner())
        .filter(warehouses::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::not_found(EntityKind::Warehouse, id))
}

async fn ensure_code_free<C: ConnectionTrait>(conn: &C, code: &str, except: Option<WarehouseId>) -> LedgerResult<()> {
    let mut query = warehouses::Entity::find().filter(warehouses::Column::Code.eq(code));
    if let Some(id) = except {
        query = query.filter(warehouses::Column::Id.ne(id.into_inner()));
    }
    if query.count(conn).await.map_err(db_err)? > 0 {
        return Err(LedgerError::DuplicateCode {
            kind: EntityKind::Warehouse,
            code: code.to_string(),
        });
    }
    Ok(())
}
