use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::budget::Budget;
use crate::manager::StorageBackend;
use crate::models::{Category, Priority, WishItem};

/// SQLite-backed store. Holds one connection for the life of the process;
/// items and budgets are scoped per user, so several owners can share one
/// database file.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.initialize()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS items (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    price REAL NOT NULL,
                    purchased INTEGER DEFAULT 0,
                    category INTEGER DEFAULT 0,
                    priority INTEGER DEFAULT 1,
                    notes TEXT,
                    link TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS budgets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER UNIQUE NOT NULL,
                    max_budget REAL DEFAULT 0.0,
                    spent_amount REAL DEFAULT 0.0,
                    enabled INTEGER DEFAULT 0,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS price_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    item_id INTEGER NOT NULL,
                    price REAL NOT NULL,
                    recorded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY(item_id) REFERENCES items(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_items_user_id ON items(user_id);
                CREATE INDEX IF NOT EXISTS idx_items_purchased ON items(purchased);
                CREATE INDEX IF NOT EXISTS idx_items_category ON items(category);",
            )
            .context("Failed to create tables")?;
        info!("database schema ready");
        Ok(())
    }

    // --- Users ---

    /// Register a username. Safe to call for an existing user.
    pub fn create_user(&self, username: &str) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (username) VALUES (?1)",
            params![username],
        )?;
        if inserted > 0 {
            info!("user created: {username}");
        }
        Ok(())
    }

    pub fn get_user_id(&self, username: &str) -> Result<Option<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM users WHERE username = ?1")?;
        let mut rows = stmt.query(params![username])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_user_id(username)?.is_some())
    }

    pub fn get_all_users(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username FROM users ORDER BY username")?;
        let users = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    // --- Items ---

    fn item_from_row(row: &rusqlite::Row) -> rusqlite::Result<WishItem> {
        Ok(WishItem {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            purchased: row.get::<_, i64>(3)? != 0,
            category: Category::from_ordinal(row.get(4)?).unwrap_or_default(),
            priority: Priority::from_ordinal(row.get(5)?).unwrap_or_default(),
            notes: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            link: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        })
    }

    /// Upsert an item by id, scoped to the owner (created when missing).
    pub fn save_item(&self, item: &WishItem, owner: &str) -> Result<()> {
        self.create_user(owner)?;
        let user_id = self
            .get_user_id(owner)?
            .with_context(|| format!("user not found: {owner}"))?;

        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO items
                 (id, user_id, name, price, purchased, category, priority, notes, link, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    item.id,
                    user_id,
                    item.name,
                    item.price,
                    i64::from(item.purchased),
                    item.category.ordinal(),
                    item.priority.ordinal(),
                    item.notes,
                    item.link,
                    now,
                ],
            )
            .with_context(|| format!("failed to save item {}", item.id))?;
        debug!("item saved: id {} name {}", item.id, item.name);
        Ok(())
    }

    /// Same upsert as [`save_item`](Self::save_item).
    pub fn update_item(&self, item: &WishItem, owner: &str) -> Result<()> {
        self.save_item(item, owner)
    }

    /// Delete the item row matching both the id and the resolved user.
    pub fn delete_item(&self, item_id: i64, owner: &str) -> Result<bool> {
        let Some(user_id) = self.get_user_id(owner)? else {
            return Ok(false);
        };
        let rows = self.conn.execute(
            "DELETE FROM items WHERE id = ?1 AND user_id = ?2",
            params![item_id, user_id],
        )?;
        if rows > 0 {
            info!("item deleted: id {item_id}");
        }
        Ok(rows > 0)
    }

    /// All of the owner's items ordered by id, with their stored ids.
    pub fn load_items(&self, owner: &str) -> Result<Vec<WishItem>> {
        let Some(user_id) = self.get_user_id(owner)? else {
            warn!("user not found: {owner}");
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, name, price, purchased, category, priority, notes, link
             FROM items
             WHERE user_id = ?1
             ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![user_id], Self::item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        info!("loaded {} items for {owner}", items.len());
        Ok(items)
    }

    // --- Budgets ---

    /// Upsert the single budget row for an owner (created when missing).
    pub fn save_budget(&self, budget: &Budget, owner: &str) -> Result<()> {
        self.create_user(owner)?;
        let user_id = self
            .get_user_id(owner)?
            .with_context(|| format!("user not found: {owner}"))?;

        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO budgets
             (user_id, max_budget, spent_amount, enabled, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                budget.max_budget(),
                budget.spent_amount(),
                i64::from(budget.is_enabled()),
                now,
            ],
        )?;
        debug!("budget saved for {owner}");
        Ok(())
    }

    /// The owner's budget; a missing row (or unknown user) yields a default
    /// disabled budget.
    pub fn load_budget(&self, owner: &str) -> Result<Budget> {
        let Some(user_id) = self.get_user_id(owner)? else {
            return Ok(Budget::new());
        };

        let mut stmt = self.conn.prepare(
            "SELECT max_budget, spent_amount, enabled FROM budgets WHERE user_id = ?1",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        let Some(row) = rows.next()? else {
            return Ok(Budget::new());
        };

        let mut budget = Budget::new();
        budget.set_max(row.get(0)?);
        budget.set_spent(row.get(1)?);
        if row.get::<_, i64>(2)? != 0 {
            budget.enable();
        } else {
            budget.disable();
        }
        debug!("budget loaded for {owner}");
        Ok(budget)
    }

    // --- Statistics ---

    pub fn total_items_count(&self, owner: &str) -> Result<i64> {
        let Some(user_id) = self.get_user_id(owner)? else {
            return Ok(0);
        };
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn total_value(&self, owner: &str) -> Result<f64> {
        let Some(user_id) = self.get_user_id(owner)? else {
            return Ok(0.0);
        };
        let total: Option<f64> = self.conn.query_row(
            "SELECT SUM(price) FROM items WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0.0))
    }

    // --- Utility ---

    /// Delete all of the owner's item rows; user and budget rows remain.
    pub fn clear_all_data(&self, owner: &str) -> Result<bool> {
        let Some(user_id) = self.get_user_id(owner)? else {
            return Ok(false);
        };
        let rows = self
            .conn
            .execute("DELETE FROM items WHERE user_id = ?1", params![user_id])?;
        info!("cleared {rows} items for {owner}");
        Ok(rows > 0)
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM;")?;
        Ok(())
    }

    /// Maximum item id across every user's items; 0 when the store is
    /// empty. Used to keep the id allocator ahead of all stored ids.
    pub fn global_max_item_id(&self) -> Result<i64> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM items", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }
}

impl StorageBackend for Database {
    fn save_item(&self, item: &WishItem, owner: &str) -> Result<()> {
        Database::save_item(self, item, owner)
    }

    fn update_item(&self, item: &WishItem, owner: &str) -> Result<()> {
        Database::update_item(self, item, owner)
    }

    fn delete_item(&self, id: i64, owner: &str) -> Result<bool> {
        Database::delete_item(self, id, owner)
    }

    fn load_items(&self, owner: &str) -> Result<Vec<WishItem>> {
        Database::load_items(self, owner)
    }

    fn save_budget(&self, budget: &Budget, owner: &str) -> Result<()> {
        Database::save_budget(self, budget, owner)
    }

    fn load_budget(&self, owner: &str) -> Result<Budget> {
        Database::load_budget(self, owner)
    }

    fn global_max_item_id(&self) -> Result<i64> {
        Database::global_max_item_id(self)
    }
}
