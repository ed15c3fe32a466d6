use crate::domain::identity::Identity;
use crate::domain::order::{Memo, PaymentOrder};
use crate::domain::ports::{OrderStore, OwnerIndex, TaskStore};
use crate::domain::task::{Task, TaskId};
use crate::error::{PaygateError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for unpaid reservations, keyed by memo.
pub const CF_ORDERS_PENDING: &str = "orders_pending";
/// Column Family for paid order history, keyed by payer.
pub const CF_ORDERS_SETTLED: &str = "orders_settled";
/// Column Family for task records, keyed by task id.
pub const CF_TASKS: &str = "tasks";
/// Column Family for owner index entries, keyed by owner identity.
pub const CF_OWNER_INDEX: &str = "owner_index";

/// A persistent store implementation using RocksDB.
///
/// One Column Family per map, serde_json values. Implements every storage
/// port, so a single instance can back the whole service. `Clone` shares the
/// underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    /// Serializes pending-order removals. RocksDB has no native
    /// read-and-delete, so without this lock two racing callers could both
    /// read the order before either delete lands and both report a win.
    pending_removals: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [
            CF_ORDERS_PENDING,
            CF_ORDERS_SETTLED,
            CF_TASKS,
            CF_OWNER_INDEX,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self {
            db: Arc::new(db),
            pending_removals: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaygateError::Io(std::io::Error::other(format!(
                "column family {name} not found"
            )))
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RocksDbStore {
    async fn insert_pending(&self, order: PaymentOrder) -> Result<()> {
        self.put_json(CF_ORDERS_PENDING, &order.memo.0.to_be_bytes(), &order)
    }

    async fn remove_pending(&self, memo: Memo) -> Result<Option<PaymentOrder>> {
        let key = memo.0.to_be_bytes();
        // Held across get+delete so remove-if-present stays single-winner,
        // matching the guarantee the in-memory store gives under its write
        // lock.
        let _guard = self.pending_removals.lock().await;
        let existing: Option<PaymentOrder> = self.get_json(CF_ORDERS_PENDING, &key)?;
        if existing.is_some() {
            let cf = self.cf(CF_ORDERS_PENDING)?;
            self.db.delete_cf(cf, key)?;
        }
        Ok(existing)
    }

    async fn get_pending(&self, memo: Memo) -> Result<Option<PaymentOrder>> {
        self.get_json(CF_ORDERS_PENDING, &memo.0.to_be_bytes())
    }

    async fn insert_settled(&self, order: PaymentOrder) -> Result<()> {
        self.put_json(CF_ORDERS_SETTLED, order.payer.as_str().as_bytes(), &order)
    }

    async fn get_settled(&self, payer: &Identity) -> Result<Option<PaymentOrder>> {
        self.get_json(CF_ORDERS_SETTLED, payer.as_str().as_bytes())
    }
}

#[async_trait]
impl TaskStore for RocksDbStore {
    async fn store(&self, task: Task) -> Result<()> {
        self.put_json(CF_TASKS, task.id.0.as_bytes(), &task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        self.get_json(CF_TASKS, id.0.as_bytes())
    }

    async fn remove(&self, id: TaskId) -> Result<Option<Task>> {
        let existing: Option<Task> = self.get_json(CF_TASKS, id.0.as_bytes())?;
        if existing.is_some() {
            let cf = self.cf(CF_TASKS)?;
            self.db.delete_cf(cf, id.0.as_bytes())?;
        }
        Ok(existing)
    }

    async fn all_ids(&self) -> Result<Vec<TaskId>> {
        let cf = self.cf(CF_TASKS)?;
        let mut ids = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let task: Task = serde_json::from_slice(&value)?;
            ids.push(task.id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl OwnerIndex for RocksDbStore {
    async fn ids_for(&self, owner: &Identity) -> Result<Vec<TaskId>> {
        Ok(self
            .get_json(CF_OWNER_INDEX, owner.as_str().as_bytes())?
            .unwrap_or_default())
    }

    async fn store(&self, owner: Identity, ids: Vec<TaskId>) -> Result<()> {
        self.put_json(CF_OWNER_INDEX, owner.as_str().as_bytes(), &ids)
    }

    async fn owners(&self) -> Result<Vec<Identity>> {
        let cf = self.cf(CF_OWNER_INDEX)?;
        let mut owners = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (key, _value) = item?;
            let owner = String::from_utf8(key.to_vec()).map_err(|e| {
                PaygateError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("non-utf8 owner key: {e}"),
                ))
            })?;
            owners.push(Identity::new(owner));
        }
        Ok(owners)
    }
}
