//! Account repository for chart of accounts database operations.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::journal::{AccountBalance, account_balances};
use tally_core::registry::{
    AccountInfo, AccountType, Availability, ensure_acyclic, ensure_usable, normalize_code, normalize_name,
};
use tally_core::{EntityKind, LedgerError, LedgerResult};
use tally_shared::types::{AccountId, CurrencyCode};
use tracing::info;

use super::{db_err, write_err};
use crate::entities::{self, accounts, journal_entries, journal_lines, sea_orm_active_enums};

/// Advisory lock key held by every reparenting transaction on PostgreSQL.
const ACCOUNT_TREE_LOCK: i64 = 0x7461_6c6c_7901;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account code (unique).
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: Option<String>,
    /// Account type.
    pub account_type: AccountType,
    /// Parent account ID for hierarchical structure.
    pub parent_id: Option<AccountId>,
    /// Whether the account is active.
    pub is_active: bool,
}

/// Input for updating an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// Account code.
    pub code: Option<String>,
    /// Account name.
    pub name: Option<String>,
    /// Account description.
    pub description: Option<Option<String>>,
    /// Account type (only while no journal lines reference the account).
    pub account_type: Option<AccountType>,
    /// Parent account ID; `Some(None)` makes the account a root.
    pub parent_id: Option<Option<AccountId>>,
    /// Whether the account is active.
    pub is_active: Option<bool>,
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Filter by account type.
    pub account_type: Option<AccountType>,
    /// Filter by active status.
    pub is_active: Option<bool>,
    /// Filter by parent ID (`Some(None)` = root accounts only).
    pub parent_id: Option<Option<AccountId>>,
}

/// Validation view of a stored account.
#[must_use]
pub fn account_info(model: &accounts::Model) -> AccountInfo {
    AccountInfo {
        id: model.id.into(),
        account_type: model.account_type.into(),
        availability: Availability::new(model.is_active, model.deleted_at.is_some()),
    }
}

/// Loads validation views for the given account ids in one query.
///
/// Unknown ids are simply absent from the map.
pub(crate) async fn load_account_infos<C, I>(conn: &C, ids: I) -> LedgerResult<HashMap<AccountId, AccountInfo>>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = AccountId>,
{
    let ids: Vec<uuid::Uuid> = ids.into_iter().map(AccountId::into_inner).collect();
    let models = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids))
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(models.iter().map(|m| (m.id.into(), account_info(m))).collect())
}

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// - `InvalidField` for an empty or oversized code or name
    /// - `DuplicateCode` if the code is taken
    /// - `UnusableReference` if the parent is unknown or deleted
    pub async fn create_account(&self, input: CreateAccountInput) -> LedgerResult<accounts::Model> {
        let code = normalize_code("code", &input.code)?;
        let name = normalize_name("name", &input.name)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        ensure_code_free(&txn, &code, None).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = accounts::Entity::find_by_id(parent_id.into_inner())
                .one(&txn)
                .await
                .map_err(db_err)?;
            // A deactivated parent is fine; only a missing or deleted one is not.
            ensure_usable(
                EntityKind::Account,
                parent_id.into_inner(),
                parent.map(|p| Availability::new(true, p.deleted_at.is_some())),
            )?;
        }

        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            code: Set(code.clone()),
            name: Set(name),
            description: Set(trim_optional(input.description)),
            account_type: Set(input.account_type.into()),
            parent_id: Set(input.parent_id.map(AccountId::into_inner)),
            is_active: Set(input.is_active),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(write_err(EntityKind::Account, &code))?;

        txn.commit().await.map_err(db_err)?;

        info!(account_id = %account.id, code = %account.code, "Account created");
        Ok(account)
    }

    /// Finds a visible (not soft-deleted) account.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist or is soft-deleted.
    pub async fn get_account(&self, id: AccountId) -> LedgerResult<accounts::Model> {
        find_visible(&self.db, id).await
    }

    /// Lists visible accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(&self, filter: AccountFilter) -> LedgerResult<Vec<accounts::Model>> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Code);

        if let Some(account_type) = filter.account_type {
            query = query.filter(
                accounts::Column::AccountType.eq(sea_orm_active_enums::AccountType::from(account_type)),
            );
        }

        if let Some(is_active) = filter.is_active {
            query = query.filter(accounts::Column::IsActive.eq(is_active));
        }

        if let Some(parent_id) = filter.parent_id {
            match parent_id {
                Some(pid) => {
                    query = query.filter(accounts::Column::ParentId.eq(pid.into_inner()));
                }
                None => {
                    query = query.filter(accounts::Column::ParentId.is_null());
                }
            }
        }

        query.all(&self.db).await.map_err(db_err)
    }

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist or is soft-deleted
    /// - `DuplicateCode` if the new code is taken
    /// - `AccountTypeLocked` when changing the type of an account with lines
    /// - `UnusableReference` if the new parent is unknown or deleted
    /// - `AccountCycle` if the new parent is the account or one of its descendants
    pub async fn update_account(&self, id: AccountId, input: UpdateAccountInput) -> LedgerResult<accounts::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let account = find_visible(&txn, id).await?;

        let code = match input.code {
            Some(raw) => {
                let code = normalize_code("code", &raw)?;
                if code != account.code {
                    ensure_code_free(&txn, &code, Some(id)).await?;
                }
                Some(code)
            }
            None => None,
        };

        let name = input.name.as_deref().map(|n| normalize_name("name", n)).transpose()?;

        if let Some(new_type) = input.account_type
            && sea_orm_active_enums::AccountType::from(new_type) != account.account_type
        {
            let lines = count_lines(&txn, id).await?;
            if lines > 0 {
                return Err(LedgerError::AccountTypeLocked(id.into_inner()));
            }
        }

        if let Some(Some(parent_id)) = input.parent_id {
            let parent = accounts::Entity::find_by_id(parent_id.into_inner())
                .one(&txn)
                .await
                .map_err(db_err)?;
            ensure_usable(
                EntityKind::Account,
                parent_id.into_inner(),
                parent.map(|p| Availability::new(true, p.deleted_at.is_some())),
            )?;

            // The cycle check must see every reparent committed before it.
            lock_account_tree(&txn).await?;
            let links = parent_links(&txn).await?;
            ensure_acyclic(id, parent_id, |node| links.get(&node).copied().flatten())?;
        }

        let mut active: accounts::ActiveModel = account.into();
        if let Some(code) = code.clone() {
            active.code = Set(code);
        }
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(trim_optional(description));
        }
        if let Some(account_type) = input.account_type {
            active.account_type = Set(account_type.into());
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id.map(AccountId::into_inner));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active
            .update(&txn)
            .await
            .map_err(write_err(EntityKind::Account, code.as_deref().unwrap_or_default()))?;
        txn.commit().await.map_err(db_err)?;

        info!(account_id = %updated.id, "Account updated");
        Ok(updated)
    }

    /// Deactivates an account. New lines can no longer reference it and
    /// drafts referencing it can no longer be posted.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist or is soft-deleted.
    pub async fn deactivate_account(&self, id: AccountId) -> LedgerResult<accounts::Model> {
        let account = find_visible(&self.db, id).await?;
        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        let updated = active.update(&self.db).await.map_err(db_err)?;

        info!(account_id = %updated.id, "Account deactivated");
        Ok(updated)
    }

    /// Soft-deletes an account. Always allowed; history keeps referencing it.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist or is already soft-deleted.
    pub async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        let account = find_visible(&self.db, id).await?;
        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(entities::now()));
        active.update(&self.db).await.map_err(db_err)?;

        info!(account_id = %id, "Account soft-deleted");
        Ok(())
    }

    /// Hard-deletes an account that nothing references.
    ///
    /// Soft-deleted accounts can be purged too.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `StillReferenced` if journal lines or child accounts reference it
    pub async fn purge_account(&self, id: AccountId) -> LedgerResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        accounts::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Account, id))?;

        let children = accounts::Entity::find()
            .filter(accounts::Column::ParentId.eq(id.into_inner()))
            .count(&txn)
            .await
            .map_err(db_err)?;
        let references = count_lines(&txn, id).await? + children;
        if references > 0 {
            return Err(LedgerError::StillReferenced {
                kind: EntityKind::Account,
                id: id.into_inner(),
                references,
            });
        }

        accounts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(account_id = %id, "Account purged");
        Ok(())
    }

    /// Balance of an account per currency over POSTED lines.
    ///
    /// Drafts and voided entries do not contribute.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist or is soft-deleted.
    pub async fn account_balances(&self, id: AccountId) -> LedgerResult<Vec<AccountBalance>> {
        let account = find_visible(&self.db, id).await?;

        let lines = journal_lines::Entity::find()
            .inner_join(journal_entries::Entity)
            .filter(journal_lines::Column::AccountId.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Posted))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let amounts = lines
            .into_iter()
            .map(|line| {
                let currency = CurrencyCode::parse(&line.currency)
                    .map_err(|e| LedgerError::Internal(format!("stored currency is invalid: {e}")))?;
                Ok((currency, line.amount.round_dp(4), line.is_debit))
            })
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(account_balances(id, account.account_type.into(), amounts))
    }
}

async fn find_visible<C: ConnectionTrait>(conn: &C, id: AccountId) -> LedgerResult<accounts::Model> {
    accounts::Entity::find_by_id(id.into_inner())
        .filter(accounts::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::not_found(EntityKind::Account, id))
}

async fn ensure_code_free<C: ConnectionTrait>(conn: &C, code: &str, except: Option<AccountId>) -> LedgerResult<()> {
    let mut query = accounts::Entity::find().filter(accounts::Column::Code.eq(code));
    if let Some(id) = except {
        query = query.filter(accounts::Column::Id.ne(id.into_inner()));
    }
    let taken = query.count(conn).await.map_err(db_err)?;
    if taken > 0 {
        return Err(LedgerError::DuplicateCode {
            kind: EntityKind::Account,
            code: code.to_string(),
        });
    }
    Ok(())
}

async fn count_lines<C: ConnectionTrait>(conn: &C, id: AccountId) -> LedgerResult<u64> {
    journal_lines::Entity::find()
        .filter(journal_lines::Column::AccountId.eq(id.into_inner()))
        .count(conn)
        .await
        .map_err(db_err)
}

/// Stored parent link of every account, deleted ones included.
/// Serializes reparenting until the surrounding transaction ends.
///
/// Two moves that each pass the cycle check against the other's
/// uncommitted state could otherwise close a loop together, even when they
/// touch disjoint rows. SQLite admits one writer at a time, so only
/// PostgreSQL takes the lock.
async fn lock_account_tree<C: ConnectionTrait>(conn: &C) -> LedgerResult<()> {
    if conn.get_database_backend() == DbBackend::Postgres {
        conn.execute_unprepared(&format!("SELECT pg_advisory_xact_lock({ACCOUNT_TREE_LOCK})"))
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

async fn parent_links<C: ConnectionTrait>(conn: &C) -> LedgerResult<HashMap<AccountId, Option<AccountId>>> {
    let rows: Vec<(uuid::Uuid, Option<uuid::Uuid>)> = accounts::Entity::find()
        .select_only()
        .column(accounts::Column::Id)
        .column(accounts::Column::ParentId)
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(rows
        .into_iter()
        .map(|(id, parent)| (id.into(), parent.map(Into::into)))
        .collect())
}

pub(crate) fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
