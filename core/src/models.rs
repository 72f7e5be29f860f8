use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field separator of the flat-file line format. Free-text fields are not
/// escaped: a `|` inside a name corrupts the row (documented limitation).
pub const FIELD_DELIMITER: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Toys,
    Books,
    Electronics,
    Clothing,
    Sports,
    #[default]
    Other,
}

impl Category {
    /// Stable ordinal used by the flat-file format and the SQL schema.
    #[must_use]
    pub fn ordinal(self) -> i64 {
        match self {
            Category::Toys => 0,
            Category::Books => 1,
            Category::Electronics => 2,
            Category::Clothing => 3,
            Category::Sports => 4,
            Category::Other => 5,
        }
    }

    #[must_use]
    pub fn from_ordinal(n: i64) -> Option<Self> {
        match n {
            0 => Some(Category::Toys),
            1 => Some(Category::Books),
            2 => Some(Category::Electronics),
            3 => Some(Category::Clothing),
            4 => Some(Category::Sports),
            5 => Some(Category::Other),
            _ => None,
        }
    }

    /// Case-insensitive parse; unrecognized input falls back to `Other`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "toys" => Category::Toys,
            "books" => Category::Books,
            "electronics" => Category::Electronics,
            "clothing" => Category::Clothing,
            "sports" => Category::Sports,
            _ => Category::Other,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Toys => "Toys",
            Category::Books => "Books",
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Sports => "Sports",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Stable ordinal used by the flat-file format and the SQL schema.
    #[must_use]
    pub fn ordinal(self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    #[must_use]
    pub fn from_ordinal(n: i64) -> Option<Self> {
        match n {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            3 => Some(Priority::Urgent),
            _ => None,
        }
    }

    /// Case-insensitive parse; unrecognized input falls back to `Medium`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            "urgent" => Priority::Urgent,
            _ => Priority::Medium,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hands out monotonically increasing item ids.
///
/// Ids are never reused after deletion. Decoding a persisted item advances
/// the allocator past the decoded id, so freshly constructed items cannot
/// collide with anything already loaded.
#[derive(Debug, Clone)]
pub struct ItemIdAllocator {
    next: i64,
}

impl ItemIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Note an id seen in persisted data, advancing past it if needed.
    pub fn observe(&mut self, id: i64) {
        if id >= self.next {
            self.next = id + 1;
        }
    }

    /// Restart numbering after `max_id`; a non-positive max resets to 1.
    pub fn reseed(&mut self, max_id: i64) {
        self.next = if max_id > 0 { max_id + 1 } else { 1 };
    }

    #[must_use]
    pub fn peek(&self) -> i64 {
        self.next
    }
}

impl Default for ItemIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// One wishlist entry. Prices are not validated: zero and negative values
/// are accepted everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub purchased: bool,
    pub category: Category,
    pub priority: Priority,
    pub notes: String,
    pub link: String,
}

impl WishItem {
    pub fn new(
        ids: &mut ItemIdAllocator,
        name: impl Into<String>,
        price: f64,
        category: Category,
    ) -> Self {
        Self {
            id: ids.allocate(),
            name: name.into(),
            price,
            purchased: false,
            category,
            priority: Priority::Medium,
            notes: String::new(),
            link: String::new(),
        }
    }

    /// Comparator for priority-based sorting: priority descending (Urgent
    /// first), ties broken by price descending.
    #[must_use]
    pub fn priority_order(a: &WishItem, b: &WishItem) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.price.total_cmp(&a.price))
    }

    /// Encode as one flat-file line:
    /// `id|name|price|purchased|category|priority|notes|link`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{id}|{name}|{price}|{purchased}|{category}|{priority}|{notes}|{link}",
            id = self.id,
            name = self.name,
            price = self.price,
            purchased = i32::from(self.purchased),
            category = self.category.ordinal(),
            priority = self.priority.ordinal(),
            notes = self.notes,
            link = self.link,
        )
    }

    /// Decode a flat-file line. Returns `None` when fewer than 6 fields are
    /// present or a numeric/enum field fails to parse. Notes and link are
    /// optional trailing fields. On success the allocator is advanced past
    /// the decoded id.
    #[must_use]
    pub fn decode(line: &str, ids: &mut ItemIdAllocator) -> Option<Self> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if fields.len() < 6 {
            return None;
        }

        let id = fields[0].parse::<i64>().ok()?;
        let price = fields[2].parse::<f64>().ok()?;
        let category = Category::from_ordinal(fields[4].parse::<i64>().ok()?)?;
        let priority = Priority::from_ordinal(fields[5].parse::<i64>().ok()?)?;

        let item = Self {
            id,
            name: fields[1].to_string(),
            price,
            purchased: fields[3] == "1",
            category,
            priority,
            notes: fields.get(6).copied().unwrap_or_default().to_string(),
            link: fields.get(7).copied().unwrap_or_default().to_string(),
        };
        ids.observe(id);
        Some(item)
    }
}

impl fmt::Display for WishItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (€{:.2})", self.id, self.name, self.price)
    }
}
