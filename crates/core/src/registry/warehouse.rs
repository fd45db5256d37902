//! Warehouse registry rules.

use tally_shared::types::WarehouseId;

use super::Availability;
use crate::error::{EntityKind, LedgerResult};

/// Information about a warehouse needed for validation.
#[derive(Debug, Clone, Copy)]
pub struct WarehouseInfo {
    /// The warehouse ID.
    pub id: WarehouseId,
    /// Active / deleted flags at the time of lookup.
    pub availability: Availability,
}

impl WarehouseInfo {
    /// Ensures stock movements can be recorded at this warehouse.
    pub fn ensure_usable(&self) -> LedgerResult<()> {
        self.availability
            .check(EntityKind::Warehouse, self.id.into_inner())
    }
}
