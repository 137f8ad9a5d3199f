use serde::{Deserialize, Serialize};

use crate::color::ColorPair;

pub const MAX_COLUMNS: u16 = 6;
pub const DEFAULT_TITLE: &str = "Menu Maker — Enhanced Categorized Menu System";
pub const DEFAULT_CATEGORY: &str = "System Tools";

/// One launchable entry.
///
/// Items have no synthetic id: lookups match on `(label, cmd)`, and two items
/// sharing both fields are indistinguishable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub label: String,
    pub cmd: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub pause: bool,
}

impl Item {
    pub fn new(label: &str, cmd: &str, info: &str, category: &str) -> Self {
        Item {
            label: label.to_string(),
            cmd: cmd.to_string(),
            info: info.to_string(),
            category: category.to_string(),
            pause: false,
        }
    }

    pub fn matches(&self, label: &str, cmd: &str) -> bool {
        self.label == label && self.cmd == cmd
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub expanded: bool,
    pub column: u16,
    pub colors: Option<ColorPair>,
    pub items: Vec<Item>,
}

impl Category {
    pub fn new(name: &str) -> Self {
        Category {
            name: name.to_string(),
            expanded: true,
            column: 1,
            colors: None,
            items: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSettings {
    pub title: String,
    pub columns: u16,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            title: DEFAULT_TITLE.to_string(),
            columns: 1,
        }
    }
}

pub fn clamp_columns(value: i64) -> u16 {
    value.clamp(1, i64::from(MAX_COLUMNS)) as u16
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuTree {
    categories: Vec<Category>,
}

impl MenuTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_tree() -> Self {
        let mut category = Category::new(DEFAULT_CATEGORY);
        category.items.push(Item::new(
            "System Monitor",
            "htop",
            "Interactive process viewer",
            DEFAULT_CATEGORY,
        ));
        MenuTree {
            categories: vec![category],
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    pub fn insert(&mut self, category: Category) -> bool {
        if self.contains(&category.name) {
            return false;
        }
        self.categories.push(category);
        true
    }

    pub fn ensure(&mut self, name: &str) -> &mut Category {
        let idx = match self.position(name) {
            Some(idx) => idx,
            None => {
                self.categories.push(Category::new(name));
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    pub fn purge_empty(&mut self) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| !c.items.is_empty());
        before != self.categories.len()
    }

    pub fn clamp_columns(&mut self, columns: u16) -> bool {
        let bound = columns.max(1);
        let mut changed = false;
        for category in &mut self.categories {
            let clamped = category.column.clamp(1, bound);
            if clamped != category.column {
                category.column = clamped;
                changed = true;
            }
        }
        changed
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    pub fn check_invariants(&self, columns: u16) -> Result<(), String> {
        for (idx, category) in self.categories.iter().enumerate() {
            if self.categories[..idx].iter().any(|c| c.name == category.name) {
                return Err(format!("duplicate category '{}'", category.name));
            }
            if category.items.is_empty() {
                return Err(format!("empty category '{}'", category.name));
            }
            if category.column < 1 || category.column > columns {
                return Err(format!(
                    "category '{}' column {} outside 1..={columns}",
                    category.name, category.column
                ));
            }
            if let Some(item) = category.items.iter().find(|i| i.category != category.name) {
                return Err(format!(
                    "item '{}' claims category '{}' inside '{}'",
                    item.label, item.category, category.name
                ));
            }
            if let Some(colors) = &category.colors {
                let valid = |hex: &str| crate::color::normalize_hex(hex).as_deref() == Some(hex);
                if !valid(&colors.background) || !valid(&colors.text) {
                    return Err(format!("category '{}' has malformed colors", category.name));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_keeps_insertion_order() {
        let mut tree = MenuTree::new();
        tree.ensure("Zeta").items.push(Item::new("z", "z", "", "Zeta"));
        tree.ensure("Alpha").items.push(Item::new("a", "a", "", "Alpha"));
        tree.ensure("Zeta").items.push(Item::new("z2", "z2", "", "Zeta"));
        assert_eq!(tree.names(), ["Zeta", "Alpha"]);
        assert_eq!(tree.get("Zeta").map(|c| c.items.len()), Some(2));
    }

    #[test]
    fn purge_empty_reports_changes() {
        let mut tree = MenuTree::default_tree();
        tree.ensure("Empty");
        assert!(tree.purge_empty());
        assert!(!tree.purge_empty());
        assert_eq!(tree.names(), [DEFAULT_CATEGORY]);
    }

    #[test]
    fn clamp_columns_only_touches_out_of_range() {
        let mut tree = MenuTree::default_tree();
        tree.ensure(DEFAULT_CATEGORY).column = 5;
        assert!(tree.clamp_columns(2));
        assert_eq!(tree.get(DEFAULT_CATEGORY).map(|c| c.column), Some(2));
        assert!(!tree.clamp_columns(2));
    }

    #[test]
    fn default_tree_satisfies_invariants() {
        assert_eq!(MenuTree::default_tree().check_invariants(1), Ok(()));
    }
}
