use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, instrument};

use crate::config::StorageConfig;
use crate::models::{Cart, StorageError, StorageResult, Validate};

/// Trait defining the interface to the cart persistence slot
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Read the stored cart, `None` when the slot is empty
    async fn load_cart(&self) -> StorageResult<Option<Cart>>;

    /// Overwrite the slot with the whole cart
    async fn save_cart(&self, cart: &Cart) -> StorageResult<()>;

    /// Empty the slot
    async fn clear_cart(&self) -> StorageResult<()>;
}

/// Parse the text held in a slot and check the cart invariants
pub fn parse_cart(key: &str, text: &str) -> StorageResult<Cart> {
    let cart: Cart = serde_json::from_str(text).map_err(|e| StorageError::CorruptState {
        key: key.to_string(),
        message: e.to_string(),
    })?;

    cart.validate().map_err(|e| StorageError::CorruptState {
        key: key.to_string(),
        message: e.to_string(),
    })?;

    Ok(cart)
}

/// Local-storage file: a JSON object of string values, one of which holds the cart
///
/// Entries under other keys are preserved on every write.
pub struct FileCartRepository {
    path: PathBuf,
    key: String,
}

type Slots = BTreeMap<String, String>;

impl FileCartRepository {
    /// Create a new file-backed cart repository
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.storage_path.clone(), config.storage_key.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_slots(&self) -> StorageResult<Slots> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Storage file {} does not exist yet", self.path.display());
                return Ok(Slots::new());
            }
            Err(e) => return Err(e.into()),
        };

        if text.trim().is_empty() {
            return Ok(Slots::new());
        }

        serde_json::from_str(&text).map_err(|e| StorageError::CorruptState {
            key: self.key.clone(),
            message: format!("storage file {} is not valid: {}", self.path.display(), e),
        })
    }

    async fn write_slots(&self, slots: &Slots) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let text = serde_json::to_string_pretty(slots)?;
        let tmp_path = self.path.with_extension("tmp");

        tokio::fs::write(&tmp_path, text).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for FileCartRepository {
    #[instrument(skip(self), fields(key = %self.key))]
    async fn load_cart(&self) -> StorageResult<Option<Cart>> {
        let slots = self.read_slots().await?;

        match slots.get(&self.key) {
            Some(text) => {
                let cart = parse_cart(&self.key, text)?;
                info!("Loaded cart with {} items", cart.len());
                Ok(Some(cart))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, cart), fields(key = %self.key, items = cart.len()))]
    async fn save_cart(&self, cart: &Cart) -> StorageResult<()> {
        let mut slots = self.read_slots().await?;
        slots.insert(self.key.clone(), serde_json::to_string(cart)?);
        self.write_slots(&slots).await?;

        debug!("Cart written to {}", self.path.display());
        Ok(())
    }

    #[instrument(skip(self), fields(key = %self.key))]
    async fn clear_cart(&self) -> StorageResult<()> {
        let mut slots = self.read_slots().await?;
        if slots.remove(&self.key).is_some() {
            self.write_slots(&slots).await?;
        }

        info!("Cart slot cleared");
        Ok(())
    }
}

/// In-memory slot with the same text semantics as the file repository
#[derive(Default)]
pub struct InMemoryCartRepository {
    slot: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw text in the slot, as if written by an earlier session
    pub fn with_raw(text: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(text.into())),
            writes: AtomicUsize::new(0),
        }
    }

    /// Raw text currently held in the slot
    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of save and clear calls since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

const IN_MEMORY_KEY: &str = "in-memory";

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn load_cart(&self) -> StorageResult<Option<Cart>> {
        match self.raw() {
            Some(text) => parse_cart(IN_MEMORY_KEY, &text).map(Some),
            None => Ok(None),
        }
    }

    async fn save_cart(&self, cart: &Cart) -> StorageResult<()> {
        let text = serde_json::to_string(cart)?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(text);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_cart(&self) -> StorageResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
