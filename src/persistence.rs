use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::errors::StoreError;
use crate::state::menu::{Entry, Menu};

/// Written on first start when no menu file exists yet.
pub const SEED_MENU: [(&str, &str, &str); 2] = [
    ("1763786780838787402", "Turkey", "Will"),
    ("1763786910210202650", "Dessert", "Sarah"),
];

pub fn seed_menu() -> Menu {
    SEED_MENU
        .iter()
        .map(|(id, dish, who)| Entry {
            id: id.to_string(),
            dish: dish.to_string(),
            who: who.to_string(),
        })
        .collect()
}

/// Encode a menu the way it is stored on disk: a JSON array indented
/// with four spaces.
pub fn encode_menu(menu: &[Entry]) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::with_capacity(128 * (menu.len() + 1));
    let mut ser =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    menu.serialize(&mut ser)?;
    Ok(out)
}

pub fn decode_menu(data: &[u8]) -> Result<Menu, serde_json::Error> {
    serde_json::from_slice(data)
}

/// A menu together with its encoded form.
///
/// For mutations `encoded` is exactly what was written to disk, so it can be
/// published to subscribers without encoding again. `seq` counts successful
/// writes and is taken under the store lock, so it follows write order.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub seq: u64,
    pub menu: Menu,
    pub encoded: Bytes,
}

impl Snapshot {
    fn from_menu(seq: u64, menu: Menu) -> Result<Self, StoreError> {
        let encoded = encode_menu(&menu).map_err(StoreError::Encode)?;
        Ok(Self {
            seq,
            menu,
            encoded: Bytes::from(encoded),
        })
    }
}

/// File-backed menu.
///
/// Every operation runs its whole read-modify-write sequence under one lock,
/// so operations never interleave. The lock covers file I/O and JSON work
/// only; publishing happens after it is released.
///
/// The lock guards the write sequence number.
#[derive(Debug)]
pub struct MenuStore {
    path: PathBuf,
    lock: Mutex<u64>,
}

impl MenuStore {
    /// Create a store over `path` without touching the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(0),
        }
    }

    /// Create a store and seed the file if it does not exist.
    ///
    /// A seeding failure is logged and otherwise ignored; reads of a missing
    /// file still yield an empty menu.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        match store.ensure_seeded() {
            Ok(true) => tracing::info!("Created default menu at {}", store.path.display()),
            Ok(false) => tracing::debug!("Using existing menu at {}", store.path.display()),
            Err(e) => tracing::warn!("Failed to create default menu: {e}"),
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the seed menu if no file exists. Returns whether it wrote.
    ///
    /// Never overwrites an existing file, whatever it contains.
    pub fn ensure_seeded(&self) -> Result<bool, StoreError> {
        let _guard = self.lock.lock();

        let data = encode_menu(&seed_menu()).map_err(StoreError::Encode)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(source) => {
                return Err(StoreError::Write {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        file.write_all(&data).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        Ok(true)
    }

    /// Current menu. A missing or empty file reads as an empty menu.
    pub fn read(&self) -> Result<Menu, StoreError> {
        let _guard = self.lock.lock();
        self.load()
    }

    /// Current menu together with its encoded form, stamped with the
    /// sequence number of the last write.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let seq = self.lock.lock();
        let menu = self.load()?;
        Snapshot::from_menu(*seq, menu)
    }

    /// Append `entry` at the tail and persist the whole menu.
    ///
    /// The caller assigns `entry.id`; an id already on the menu is rejected.
    pub fn append(&self, entry: Entry) -> Result<Snapshot, StoreError> {
        let mut seq = self.lock.lock();

        let mut menu = self.load()?;
        if menu.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::DuplicateId(entry.id));
        }
        menu.push(entry);

        self.persist(&mut *seq, menu)
    }

    /// Drop every entry with id `id` and persist the rest, in order.
    ///
    /// An unknown id is not an error: the unchanged menu is persisted and
    /// returned.
    pub fn remove(&self, id: &str) -> Result<Snapshot, StoreError> {
        let mut seq = self.lock.lock();

        let mut menu = self.load()?;
        menu.retain(|e| e.id != id);

        self.persist(&mut *seq, menu)
    }

    fn load(&self) -> Result<Menu, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Menu::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if data.is_empty() {
            return Ok(Menu::new());
        }

        decode_menu(&data).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    // Encode first so an encoding failure never touches the file. The
    // sequence only advances once the write has succeeded.
    fn persist(&self, seq: &mut u64, menu: Menu) -> Result<Snapshot, StoreError> {
        let snapshot = Snapshot::from_menu(*seq + 1, menu)?;

        fs::write(&self.path, &snapshot.encoded).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        *seq = snapshot.seq;
        Ok(snapshot)
    }
}
