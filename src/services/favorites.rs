use serde::{Deserialize, Serialize};

use super::lookup::{EntityKind, EntityRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub meta: Option<String>,
}

impl From<&EntityRef> for FavoriteEntry {
    fn from(entity: &EntityRef) -> Self {
        Self {
            kind: entity.kind,
            id: entity.id.clone(),
            name: entity.name.clone(),
            meta: entity.meta.clone(),
        }
    }
}

/// Ordered favorites list. How it is persisted is up to the implementation.
pub trait FavoritesStore: Send {
    fn list(&self) -> Vec<FavoriteEntry>;

    /// Returns `false` when an entry with the same kind and id already exists.
    fn add(&mut self, entry: FavoriteEntry) -> bool;

    /// Returns `false` when nothing matched.
    fn remove(&mut self, kind: EntityKind, id: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryFavorites {
    entries: Vec<FavoriteEntry>,
}

impl FavoritesStore for InMemoryFavorites {
    fn list(&self) -> Vec<FavoriteEntry> {
        self.entries.clone()
    }

    fn add(&mut self, entry: FavoriteEntry) -> bool {
        if self
            .entries
            .iter()
            .any(|e| e.kind == entry.kind && e.id == entry.id)
        {
            return false;
        }
        self.entries.push(entry);
        true
    }

    fn remove(&mut self, kind: EntityKind, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !(e.kind == kind && e.id == id));
        self.entries.len() != before
    }
}
