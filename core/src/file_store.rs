use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::budget::Budget;
use crate::manager::WishlistManager;
use crate::models::{FIELD_DELIMITER, WishItem};

/// Flat-file store: the owner name on line 1, then one encoded line per
/// item. The budget lives in a sidecar file next to the data file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn budget_path(&self) -> PathBuf {
        self.path.with_extension("budget")
    }

    /// Overwrite the destination with the manager's owner and items.
    pub fn save(&self, manager: &WishlistManager) -> Result<()> {
        let file = File::create(&self.path).with_context(|| {
            format!("Could not open file for writing: {}", self.path.display())
        })?;
        let mut out = BufWriter::new(file);

        writeln!(out, "{}", manager.owner())?;
        for item in manager.items() {
            writeln!(out, "{}", item.encode())?;
        }
        out.flush()?;

        info!(
            "saved {} items to {}",
            manager.total_items(),
            self.path.display()
        );
        Ok(())
    }

    /// Load items into the manager. A zero-length file is "no data, not an
    /// error" and leaves the manager untouched. A first non-blank line
    /// containing the field delimiter marks an old-format file with no
    /// owner line: that line is decoded as an item and the manager's
    /// current owner is kept. Undecodable lines are skipped. Returns true
    /// iff at least one item was loaded.
    pub fn load(&self, manager: &mut WishlistManager) -> Result<bool> {
        info!("loading wishlist from {}", self.path.display());
        let content = fs::read_to_string(&self.path).with_context(|| {
            format!("Could not open file for reading: {}", self.path.display())
        })?;
        if content.is_empty() {
            info!("file is empty, starting fresh");
            return Ok(false);
        }

        let mut lines = content.lines().filter(|line| !line.is_empty());
        let Some(first) = lines.next() else {
            warn!("file contains only empty lines");
            return Ok(false);
        };

        let mut count = 0;
        if first.contains(FIELD_DELIMITER) {
            // Old format without an owner line; the current owner is kept.
            info!("old format detected (no owner line)");
            if let Some(item) = WishItem::decode(first, manager.ids_mut()) {
                manager.add_item(item);
                count += 1;
            }
        } else {
            info!("setting owner from file: {first}");
            manager.set_owner(first);
        }

        for line in lines {
            if let Some(item) = WishItem::decode(line, manager.ids_mut()) {
                manager.add_item(item);
                count += 1;
            } else {
                debug!("skipping undecodable line: {line}");
            }
        }

        info!("loaded {count} items for {}", manager.owner());
        Ok(count > 0)
    }

    /// Write the budget to the sidecar file in its `max|spent|enabled`
    /// encoding.
    pub fn save_budget(&self, budget: &Budget) -> Result<()> {
        let path = self.budget_path();
        fs::write(&path, format!("{}\n", budget.encode()))
            .with_context(|| format!("Could not write budget file: {}", path.display()))?;
        debug!("budget saved to {}", path.display());
        Ok(())
    }

    /// Read the budget sidecar; a missing file yields a default budget.
    pub fn load_budget(&self) -> Result<Budget> {
        let path = self.budget_path();
        if !path.exists() {
            return Ok(Budget::new());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read budget file: {}", path.display()))?;
        Ok(Budget::decode(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Priority};

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().join("wishlist.dat"))
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut manager = WishlistManager::new("Sam");
        let mut item = WishItem::new(manager.ids_mut(), "Lego Set", 49.99, Category::Toys);
        item.priority = Priority::High;
        item.notes = "birthday".to_string();
        manager.add_item(item);
        let item = WishItem::new(manager.ids_mut(), "Novel", 12.5, Category::Books);
        manager.add_item(item);
        store.save(&manager).unwrap();

        let mut restored = WishlistManager::new("Default");
        assert!(store.load(&mut restored).unwrap());
        assert_eq!(restored.owner(), "Sam");
        assert_eq!(restored.items(), manager.items());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut manager = WishlistManager::new("Sam");
        assert!(store.load(&mut manager).is_err());
    }

    #[test]
    fn test_load_empty_file_returns_false_and_keeps_items() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "").unwrap();

        let mut manager = WishlistManager::new("Sam");
        let item = WishItem::new(manager.ids_mut(), "Ball", 10.0, Category::Sports);
        manager.add_item(item);

        assert!(!store.load(&mut manager).unwrap());
        assert_eq!(manager.total_items(), 1);
        assert_eq!(manager.owner(), "Sam");
    }

    #[test]
    fn test_load_blank_lines_only_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "\n\n\n").unwrap();

        let mut manager = WishlistManager::new("Sam");
        assert!(!store.load(&mut manager).unwrap());
    }

    #[test]
    fn test_load_old_format_keeps_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "3|Gift|20|0|1|2||\n").unwrap();

        let mut manager = WishlistManager::new("Sam");
        assert!(store.load(&mut manager).unwrap());
        assert_eq!(manager.owner(), "Sam");
        assert_eq!(manager.total_items(), 1);
        let item = manager.find_by_id(3).unwrap();
        assert_eq!(item.name, "Gift");
        assert_eq!(item.category, Category::Books);
    }

    #[test]
    fn test_load_skips_leading_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "\n\nSam\n1|Ball|10|0|4|1||\n").unwrap();

        let mut manager = WishlistManager::new("Default");
        assert!(store.load(&mut manager).unwrap());
        assert_eq!(manager.owner(), "Sam");
        assert_eq!(manager.total_items(), 1);
    }

    #[test]
    fn test_load_skips_undecodable_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "Sam\n1|Ball|10|0|4|1||\nnot|an|item\n2|Book|5|0|1|0||\n",
        )
        .unwrap();

        let mut manager = WishlistManager::new("Default");
        assert!(store.load(&mut manager).unwrap());
        assert_eq!(manager.total_items(), 2);
    }

    #[test]
    fn test_loaded_ids_advance_allocator() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "Sam\n7|Ball|10|0|4|1||\n").unwrap();

        let mut manager = WishlistManager::new("Default");
        store.load(&mut manager).unwrap();
        let fresh = WishItem::new(manager.ids_mut(), "Book", 5.0, Category::Books);
        assert!(fresh.id > 7);
    }

    #[test]
    fn test_budget_sidecar_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut budget = Budget::with_limit(120.0);
        budget.set_spent(45.5);
        store.save_budget(&budget).unwrap();

        let loaded = store.load_budget().unwrap();
        assert!((loaded.max_budget() - 120.0).abs() < f64::EPSILON);
        assert!((loaded.spent_amount() - 45.5).abs() < f64::EPSILON);
        assert!(loaded.is_enabled());
    }

    #[test]
    fn test_missing_budget_sidecar_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let budget = store.load_budget().unwrap();
        assert!(!budget.is_enabled());
    }
}
