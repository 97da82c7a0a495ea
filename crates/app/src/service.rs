//! Application facade: what the presentation layer calls.
//!
//! Each mutating operation takes the acting user explicitly, checks its role,
//! runs the domain operation, then writes the touched collections back to the
//! table store.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone};

use stockroom_auth::{
    Actor, Authenticator, CredentialHasher, LocalAuthenticator, NewUser, Role, SessionGuard, User,
    UserDirectory,
};
use stockroom_core::{CategoryId, Clock, DomainError, ItemId, LocationId, SystemClock, UserId};
use stockroom_infra::seed::{self, OPENING_BALANCE_NOTE};
use stockroom_infra::tables::{self, collections, save_records};
use stockroom_infra::{DirectoryTableStore, InMemoryTableStore, Snapshot, TableStore};
use stockroom_inventory::{
    CatalogStore, Category, History, Item, ItemFilter, ItemPatch, LabelPatch, LedgerEngine,
    Location, MovementType, NewItem, ReconcileReport, StockMovement,
};

use crate::config::AppConfig;
use crate::dashboard::{self, DashboardStats, MovementView};
use crate::error::AppResult;

/// The inventory application over one table store.
pub struct InventoryService {
    store: Arc<dyn TableStore>,
    clock: Arc<dyn Clock>,
    users: Arc<UserDirectory>,
    authenticator: Arc<dyn Authenticator>,
    ledger: LedgerEngine,
    startup_report: ReconcileReport,
    persist_lock: Mutex<()>,
}

impl core::fmt::Debug for InventoryService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryService")
            .field("catalog", self.ledger.catalog())
            .field("movements", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

impl InventoryService {
    /// Build the store described by `config`, seed it if asked, and open it.
    pub fn bootstrap(config: &AppConfig) -> AppResult<Self> {
        let store: Arc<dyn TableStore> = match &config.data_dir {
            Some(dir) => Arc::new(DirectoryTableStore::open(dir)?),
            None => Arc::new(InMemoryTableStore::new()),
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let hasher = CredentialHasher::configured(config.argon2_memory_kib, config.argon2_iterations)?;

        if config.seed {
            let demo = seed::demo_snapshot(clock.now(), config.admin_password.as_deref(), &hasher)?;
            tables::initialize(&store, &demo)?;
        }

        let service = Self::open(store, clock, hasher)?;
        match &config.auth_url {
            Some(url) => service.with_remote_auth(url),
            None => Ok(service),
        }
    }

    /// Load every collection and check item amounts against the ledger.
    ///
    /// Drifted amounts are logged, repaired from the ledger and written back.
    pub fn open(store: Arc<dyn TableStore>, clock: Arc<dyn Clock>, hasher: CredentialHasher) -> AppResult<Self> {
        let snapshot = Snapshot::load(&store)?;
        tracing::info!(
            users = snapshot.users.len(),
            items = snapshot.items.len(),
            movements = snapshot.movements.len(),
            "inventory loaded"
        );

        let users = Arc::new(UserDirectory::from_tables(hasher, snapshot.users, snapshot.credentials));
        let catalog = Arc::new(CatalogStore::from_tables(
            Arc::clone(&clock),
            snapshot.categories,
            snapshot.locations,
            snapshot.items,
        ));
        let ledger = LedgerEngine::with_movements(catalog, snapshot.movements);
        let authenticator: Arc<dyn Authenticator> = Arc::new(LocalAuthenticator::new(Arc::clone(&users)));

        let service = Self {
            store,
            clock,
            users,
            authenticator,
            ledger,
            startup_report: ReconcileReport::default(),
            persist_lock: Mutex::new(()),
        };
        service.reconcile_on_open()
    }

    fn reconcile_on_open(mut self) -> AppResult<Self> {
        let report = self.ledger.reconcile();
        if !report.is_consistent() {
            tracing::warn!(mismatches = report.mismatches.len(), "repairing item amounts from ledger");
            self.ledger.repair(&report)?;
            self.save(&[collections::ITEMS])?;
        }
        self.startup_report = report;
        Ok(self)
    }

    #[cfg(feature = "remote")]
    fn with_remote_auth(self, url: &str) -> AppResult<Self> {
        let remote = stockroom_auth::RemoteAuthenticator::new(url)?;
        tracing::info!(url, "delegating authentication to remote service");
        Ok(self.with_authenticator(Arc::new(remote)))
    }

    #[cfg(not(feature = "remote"))]
    fn with_remote_auth(self, url: &str) -> AppResult<Self> {
        tracing::warn!(url, "remote auth configured but the `remote` feature is off; using local credentials");
        Ok(self)
    }

    /// Verify logins with `authenticator` instead of the local credential table.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// What the load-time consistency check found.
    pub fn startup_report(&self) -> &ReconcileReport {
        &self.startup_report
    }

    pub fn catalog(&self) -> &CatalogStore {
        self.ledger.catalog()
    }

    pub fn ledger(&self) -> &LedgerEngine {
        &self.ledger
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// A fresh guard, resumed from the persisted session pointer if it still resolves.
    pub fn session(&self) -> AppResult<SessionGuard> {
        let mut guard = SessionGuard::new(Arc::clone(&self.authenticator), Arc::clone(&self.users));
        let saved = tables::load_current_user(&self.store)?;
        if guard.restore(saved).is_none() && saved.is_some() {
            tables::save_current_user(&self.store, None)?;
        }
        Ok(guard)
    }

    /// Sign in and persist the session pointer.
    ///
    /// An account resolved by a non-local authenticator is recorded in the user
    /// table, so the session restores and its movements show a name.
    pub fn login(&self, guard: &mut SessionGuard, email: &str, credential: &str) -> AppResult<User> {
        let previous = guard.current_user().map(|u| u.id);
        let user = guard.authenticate(email, credential)?;
        match self.users.remember(&user) {
            Ok(true) => self.save(&[collections::USERS])?,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "login rejected; account clashes with a local one");
                guard.restore(previous);
                return Err(e.into());
            }
        }
        tables::save_current_user(&self.store, Some(user.id))?;
        Ok(user)
    }

    pub fn logout(&self, guard: &mut SessionGuard) -> AppResult<()> {
        guard.logout();
        tables::save_current_user(&self.store, None)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    pub fn list_users(&self, actor: &Actor) -> AppResult<Vec<User>> {
        actor.require(Role::Admin)?;
        Ok(self.users.list())
    }

    pub fn provision_user(&self, actor: &Actor, new: NewUser) -> AppResult<User> {
        actor.require(Role::Admin)?;
        let user = self.users.provision(new, self.clock.now())?;
        self.save(&[collections::USERS, collections::CREDENTIALS])?;
        Ok(user)
    }

    /// Set a user's password. Admins may set anyone's; others only their own.
    pub fn set_password(&self, actor: &Actor, user_id: UserId, password: &str) -> AppResult<()> {
        if actor.user_id() != user_id {
            actor.require(Role::Admin)?;
        }
        self.users.set_password(user_id, password)?;
        self.save(&[collections::CREDENTIALS])
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Categories and locations (admin only)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_category(&self, actor: &Actor, name: &str, description: Option<String>) -> AppResult<Category> {
        actor.require(Role::Admin)?;
        let category = self.catalog().create_category(name, description)?;
        self.save(&[collections::CATEGORIES])?;
        Ok(category)
    }

    pub fn update_category(&self, actor: &Actor, id: CategoryId, patch: LabelPatch) -> AppResult<Category> {
        actor.require(Role::Admin)?;
        let category = self.catalog().update_category(id, patch)?;
        self.save(&[collections::CATEGORIES])?;
        Ok(category)
    }

    pub fn delete_category(&self, actor: &Actor, id: CategoryId) -> AppResult<()> {
        actor.require(Role::Admin)?;
        self.catalog().delete_category(id)?;
        self.save(&[collections::CATEGORIES])
    }

    pub fn create_location(&self, actor: &Actor, name: &str, description: Option<String>) -> AppResult<Location> {
        actor.require(Role::Admin)?;
        let location = self.catalog().create_location(name, description)?;
        self.save(&[collections::LOCATIONS])?;
        Ok(location)
    }

    pub fn update_location(&self, actor: &Actor, id: LocationId, patch: LabelPatch) -> AppResult<Location> {
        actor.require(Role::Admin)?;
        let location = self.catalog().update_location(id, patch)?;
        self.save(&[collections::LOCATIONS])?;
        Ok(location)
    }

    pub fn delete_location(&self, actor: &Actor, id: LocationId) -> AppResult<()> {
        actor.require(Role::Admin)?;
        self.catalog().delete_location(id)?;
        self.save(&[collections::LOCATIONS])
    }

    pub fn categories(&self) -> Vec<Category> {
        self.catalog().list_categories()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.catalog().list_locations()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an item; a non-zero starting amount is booked as an opening
    /// `in` movement so the ledger accounts for every unit.
    pub fn create_item(&self, actor: &Actor, new: NewItem) -> AppResult<Item> {
        let opening = new.amount;
        if opening < 0 {
            return Err(DomainError::validation("amount", "cannot be negative").into());
        }
        let item = self.catalog().create_item(NewItem { amount: 0, ..new })?;
        if opening > 0 {
            if let Err(e) = self.ledger.record_movement(
                item.id,
                MovementType::In,
                opening,
                actor.user_id(),
                Some(OPENING_BALANCE_NOTE.to_string()),
            ) {
                if let Err(rollback) = self.catalog().delete_item(item.id) {
                    tracing::warn!(item_id = %item.id, error = %rollback, "could not roll back item after failed opening balance");
                }
                return Err(e.into());
            }
        }
        self.save(&[collections::MOVEMENTS, collections::ITEMS])?;
        Ok(self.catalog().get_item(item.id)?)
    }

    pub fn update_item(&self, _actor: &Actor, id: ItemId, patch: ItemPatch) -> AppResult<Item> {
        let item = self.catalog().update_item(id, patch)?;
        self.save(&[collections::ITEMS])?;
        Ok(item)
    }

    /// Admin only. Recorded movements of the item stay in the ledger.
    pub fn delete_item(&self, actor: &Actor, id: ItemId) -> AppResult<()> {
        actor.require(Role::Admin)?;
        self.catalog().delete_item(id)?;
        self.save(&[collections::ITEMS])
    }

    pub fn get_item(&self, id: ItemId) -> AppResult<Item> {
        Ok(self.catalog().get_item(id)?)
    }

    pub fn list_items(&self, filter: &ItemFilter) -> Vec<Item> {
        self.catalog().list_items(filter)
    }

    pub fn low_stock_items(&self) -> Vec<Item> {
        self.catalog().low_stock_items()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger
    // ─────────────────────────────────────────────────────────────────────────

    pub fn record_movement(
        &self,
        actor: &Actor,
        item_id: ItemId,
        kind: MovementType,
        quantity: i64,
        notes: Option<String>,
    ) -> AppResult<StockMovement> {
        let movement = self
            .ledger
            .record_movement(item_id, kind, quantity, actor.user_id(), notes)?;
        self.save(&[collections::MOVEMENTS, collections::ITEMS])?;
        Ok(movement)
    }

    pub fn history(&self, item_id: ItemId) -> History {
        self.ledger.history(item_id)
    }

    /// Newest movements first, with item and user names resolved.
    pub fn movement_feed(&self, limit: usize) -> Vec<MovementView> {
        let log = self.ledger.movements();
        let items = self.catalog().list_items(&ItemFilter::default());
        let users = self.users.list();
        dashboard::movement_views(log.iter().take(limit), &items, &users)
    }

    /// Dashboard figures for `day` as seen in `tz`.
    pub fn dashboard<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> DashboardStats {
        let items = self.catalog().list_items(&ItemFilter::default());
        let week = self.ledger.weekly_totals(day, tz);
        let recent = match week.first() {
            Some(first) => {
                let from = first.day;
                self.ledger
                    .movements()
                    .iter()
                    .filter(|m| {
                        let d = m.created_at.with_timezone(tz).date_naive();
                        d >= from && d <= day
                    })
                    .count()
            }
            None => 0,
        };
        dashboard::stats(&items, self.catalog().list_categories().len(), week, recent)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Write the named collections from current state.
    ///
    /// Serialized so a slower writer can never overwrite a newer snapshot.
    /// The movement log is written before items when both are named.
    fn save(&self, names: &[&str]) -> AppResult<()> {
        let _guard = self
            .persist_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for name in names {
            match *name {
                collections::USERS => save_records(&self.store, name, &self.users.list())?,
                collections::CREDENTIALS => save_records(&self.store, name, &self.users.credentials())?,
                collections::CATEGORIES => save_records(&self.store, name, &self.catalog().list_categories())?,
                collections::LOCATIONS => save_records(&self.store, name, &self.catalog().list_locations())?,
                collections::ITEMS => {
                    save_records(&self.store, name, &self.catalog().list_items(&ItemFilter::default()))?
                }
                collections::MOVEMENTS => save_records(&self.store, name, &self.ledger.export())?,
                other => tracing::warn!(collection = other, "unknown collection; not saved"),
            }
        }
        Ok(())
    }
}
