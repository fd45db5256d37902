//! Item repository for the inventory catalog.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::registry::{Availability, ItemInfo, ItemType, ValuationMethod, normalize_code, normalize_name, validate_prices};
use tally_core::{EntityKind, LedgerError, LedgerResult};
use tally_shared::types::ItemId;
use tracing::info;

use super::account::trim_optional;
use super::{db_err, write_err};
use crate::entities::{self, inventory_transactions, items, sea_orm_active_enums};

/// Input for creating an item.
#[derive(Debug, Clone)]
pub struct CreateItemInput {
    /// Stock keeping unit (unique).
    pub sku: String,
    /// Item name.
    pub name: String,
    /// Item description.
    pub description: Option<String>,
    /// Unit of measure (e.g. `PCS`, `KG`).
    pub unit_of_measure: String,
    /// Item type.
    pub item_type: ItemType,
    /// Purchase price.
    pub purchase_price: Option<Decimal>,
    /// Sales price.
    pub sales_price: Option<Decimal>,
    /// Valuation method.
    pub valuation_method: Option<ValuationMethod>,
    /// Whether the item is active.
    pub is_active: bool,
}

/// Input for updating an item. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    /// SKU.
    pub sku: Option<String>,
    /// Item name.
    pub name: Option<String>,
    /// Item description.
    pub description: Option<Option<String>>,
    /// Unit of measure.
    pub unit_of_measure: Option<String>,
    /// Item type.
    pub item_type: Option<ItemType>,
    /// Purchase price.
    pub purchase_price: Option<Option<Decimal>>,
    /// Sales price.
    pub sales_price: Option<Option<Decimal>>,
    /// Valuation method.
    pub valuation_method: Option<Option<ValuationMethod>>,
    /// Whether the item is active.
    pub is_active: Option<bool>,
}

/// Filter options for listing items.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Filter by item type.
    pub item_type: Option<ItemType>,
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// Validation view of a stored item.
#[must_use]
pub fn item_info(model: &items::Model) -> ItemInfo {
    ItemInfo {
        id: model.id.into(),
        item_type: model.item_type.into(),
        availability: Availability::new(model.is_active, model.deleted_at.is_some()),
    }
}

/// Item repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    db: DatabaseConnection,
}

impl ItemRepository {
    /// Creates a new item repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new item.
    ///
    /// # Errors
    ///
    /// `InvalidField` for malformed fields or negative prices,
    /// `DuplicateCode` if the SKU is taken.
    pub async fn create_item(&self, input: CreateItemInput) -> LedgerResult<items::Model> {
        let sku = normalize_code("sku", &input.sku)?;
        let name = normalize_name("name", &input.name)?;
        let unit_of_measure = normalize_code("unit_of_measure", &input.unit_of_measure)?;
        validate_prices(input.purchase_price, input.sales_price)?;

        ensure_sku_free(&self.db, &sku, None).await?;

        let item = items::ActiveModel {
            id: Set(ItemId::new().into_inner()),
            sku: Set(sku.clone()),
            name: Set(name),
            description: Set(trim_optional(input.description)),
            unit_of_measure: Set(unit_of_measure),
            item_type: Set(input.item_type.into()),
            purchase_price: Set(input.purchase_price),
            sales_price: Set(input.sales_price),
            valuation_method: Set(input.valuation_method.map(Into::into)),
            is_active: Set(input.is_active),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(write_err(EntityKind::Item, &sku))?;

        info!(item_id = %item.id, sku = %item.sku, "Item created");
        Ok(normalize(item))
    }

    /// Finds a visible (not soft-deleted) item.
    ///
    /// # Errors
    ///
    /// `NotFound` if the item does not exist or is soft-deleted.
    pub async fn get_item(&self, id: ItemId) -> LedgerResult<items::Model> {
        find_visible(&self.db, id).await
    }

    /// Lists visible items ordered by SKU.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_items(&self, filter: ItemFilter) -> LedgerResult<Vec<items::Model>> {
        let mut query = items::Entity::find()
            .filter(items::Column::DeletedAt.is_null())
            .order_by_asc(items::Column::Sku);

        if let Some(item_type) = filter.item_type {
            query = query.filter(items::Column::ItemType.eq(sea_orm_active_enums::ItemType::from(item_type)));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(items::Column::IsActive.eq(is_active));
        }

        let items = query.all(&self.db).await.map_err(db_err)?;
        Ok(items.into_iter().map(normalize).collect())
    }

    /// Updates an item.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidField` or `DuplicateCode`.
    pub async fn update_item(&self, id: ItemId, input: UpdateItemInput) -> LedgerResult<items::Model> {
        let item = find_visible(&self.db, id).await?;

        let sku = input.sku.as_deref().map(|s| normalize_code("sku", s)).transpose()?;
        if let Some(sku) = &sku
            && *sku != item.sku
        {
            ensure_sku_free(&self.db, sku, Some(id)).await?;
        }
        let name = input.name.as_deref().map(|n| normalize_name("name", n)).transpose()?;
        let unit_of_measure = input
            .unit_of_measure
            .as_deref()
            .map(|u| normalize_code("unit_of_measure", u))
            .transpose()?;
        validate_prices(input.purchase_price.flatten(), input.sales_price.flatten())?;

        let mut active: items::ActiveModel = item.into();
        if let Some(sku) = sku.clone() {
            active.sku = Set(sku);
        }
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(trim_optional(description));
        }
        if let Some(unit_of_measure) = unit_of_measure {
            active.unit_of_measure = Set(unit_of_measure);
        }
        if let Some(item_type) = input.item_type {
            active.item_type = Set(item_type.into());
        }
        if let Some(purchase_price) = input.purchase_price {
            active.purchase_price = Set(purchase_price);
        }
        if let Some(sales_price) = input.sales_price {
            active.sales_price = Set(sales_price);
        }
        if let Some(valuation_method) = input.valuation_method {
            active.valuation_method = Set(valuation_method.map(Into::into));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(write_err(EntityKind::Item, sku.as_deref().unwrap_or_default()))?;

        info!(item_id = %updated.id, "Item updated");
        Ok(normalize(updated))
    }

    /// Deactivates an item; new movements for it are rejected.
    ///
    /// # Errors
    ///
    /// `NotFound` if the item does not exist or is soft-deleted.
    pub async fn deactivate_item(&self, id: ItemId) -> LedgerResult<items::Model> {
        let item = find_visible(&self.db, id).await?;
        let mut active: items::ActiveModel = item.into();
        active.is_active = Set(false);
        let updated = active.update(&self.db).await.map_err(db_err)?;

        info!(item_id = %updated.id, "Item deactivated");
        Ok(normalize(updated))
    }

    /// Soft-deletes an item.
    ///
    /// # Errors
    ///
    /// `NotFound` if the item does not exist or is already soft-deleted.
    pub async fn delete_item(&self, id: ItemId) -> LedgerResult<()> {
        let item = find_visible(&self.db, id).await?;
        let mut active: items::ActiveModel = item.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(entities::now()));
        active.update(&self.db).await.map_err(db_err)?;

        info!(item_id = %id, "Item soft-deleted");
        Ok(())
    }

    /// Hard-deletes an item without inventory history.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `StillReferenced` if any inventory transaction exists.
    pub async fn purge_item(&self, id: ItemId) -> LedgerResult<()> {
        items::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Item, id))?;

        let references = inventory_transactions::Entity::find()
            .filter(inventory_transactions::Column::ItemId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        if references > 0 {
            return Err(LedgerError::StillReferenced {
                kind: EntityKind::Item,
                id: id.into_inner(),
                references,
            });
        }

        // The foreign key still guards against a movement recorded in between.
        items::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        info!(item_id = %id, "Item purged");
        Ok(())
    }
}

pub(crate) async fn find_visible<C: ConnectionTrait>(conn: &C, id: ItemId) -> LedgerResult<items::Model> {
    items::Entity::find_by_id(id.into_inner())
        .filter(items::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(db_err)?
        .map(normalize)
        .ok_or_else(|| LedgerError::not_found(EntityKind::Item, id))
}

async fn ensure_sku_free<C: ConnectionTrait>(conn: &C, sku: &str, except: Option<ItemId>) -> LedgerResult<()> {
    let mut query = items::Entity::find().filter(items::Column::Sku.eq(sku));
    if let Some(id) = except {
        query = query.filter(items::Column::Id.ne(id.into_inner()));
    }
    if query.count(conn).await.map_err(db_err)? > 0 {
        return Err(LedgerError::DuplicateCode {
            kind: EntityKind::Item,
            code: sku.to_string(),
        });
    }
    Ok(())
}

/// Prices come back from SQLite as floats; pin them to the column scale.
fn normalize(mut item: items::Model) -> items::Model {
    item.purchase_price = item.purchase_price.map(|p| p.round_dp(4));
    item.sales_price = item.sales_price.map(|p| p.round_dp(4));
    item
}
