use std::ops::Range;

use super::model::{Item, MenuTree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlatEntry {
    CategoryHeader { name: String },
    MenuItem { item: Item },
}

impl FlatEntry {
    pub fn category_name(&self) -> &str {
        match self {
            FlatEntry::CategoryHeader { name } => name,
            FlatEntry::MenuItem { item } => &item.category,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    flat: Vec<FlatEntry>,
    columns: Vec<Range<usize>>,
}

impl Projection {
    pub fn flat(&self) -> &[FlatEntry] {
        &self.flat
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FlatEntry> {
        self.flat.get(index)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, column: usize) -> (usize, &[FlatEntry]) {
        match self.columns.get(column) {
            Some(range) => (range.start, &self.flat[range.clone()]),
            None => (self.flat.len(), &[]),
        }
    }
}

/// Lays `tree` out over `column_count` columns. Empty categories are
/// skipped, columns are clamped into range, and within a column categories
/// keep tree order. Collapsed categories contribute only their header.
pub fn project(tree: &MenuTree, column_count: u16) -> Projection {
    let column_count = column_count.max(1);
    let mut projection = Projection::default();
    for column in 1..=column_count {
        let start = projection.flat.len();
        for category in tree
            .iter()
            .filter(|c| !c.items.is_empty() && c.column.clamp(1, column_count) == column)
        {
            projection.flat.push(FlatEntry::CategoryHeader {
                name: category.name.clone(),
            });
            if category.expanded {
                projection
                    .flat
                    .extend(category.items.iter().cloned().map(|item| FlatEntry::MenuItem { item }));
            }
        }
        projection.columns.push(start..projection.flat.len());
    }
    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::Category;

    fn category(name: &str, column: u16, expanded: bool, labels: &[&str]) -> Category {
        let mut category = Category::new(name);
        category.column = column;
        category.expanded = expanded;
        category.items = labels
            .iter()
            .map(|label| Item::new(label, &format!("run-{label}"), "", name))
            .collect();
        category
    }

    fn labels(entries: &[FlatEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| match entry {
                FlatEntry::CategoryHeader { name } => format!("[{name}]"),
                FlatEntry::MenuItem { item } => item.label.clone(),
            })
            .collect()
    }

    fn sample_tree() -> MenuTree {
        let mut tree = MenuTree::new();
        tree.insert(category("Net", 2, true, &["ping", "curl"]));
        tree.insert(category("Sys", 1, true, &["htop"]));
        tree.insert(category("Dev", 1, false, &["vim", "git"]));
        tree.insert(category("Far", 9, true, &["ssh"]));
        tree
    }

    #[test]
    fn columns_are_walked_in_order_then_tree_order() {
        let projection = project(&sample_tree(), 2);
        assert_eq!(
            labels(projection.flat()),
            ["[Sys]", "htop", "[Dev]", "[Net]", "ping", "curl", "[Far]", "ssh"]
        );
        let (start, second) = projection.column(1);
        assert_eq!(start, 3);
        assert_eq!(labels(second), ["[Net]", "ping", "curl", "[Far]", "ssh"]);
    }

    #[test]
    fn single_column_keeps_tree_order() {
        let projection = project(&sample_tree(), 1);
        assert_eq!(projection.column_count(), 1);
        assert_eq!(
            labels(projection.flat()),
            ["[Net]", "ping", "curl", "[Sys]", "htop", "[Dev]", "[Far]", "ssh"]
        );
    }

    #[test]
    fn empty_categories_are_skipped() {
        let mut tree = sample_tree();
        tree.ensure("Ghost");
        let projection = project(&tree, 2);
        assert!(!labels(projection.flat()).contains(&"[Ghost]".to_string()));
    }

    #[test]
    fn projection_is_deterministic() {
        let tree = sample_tree();
        assert_eq!(project(&tree, 3), project(&tree, 3));
        assert_eq!(project(&tree, 3).column_count(), 3);
        assert_eq!(labels(project(&tree, 3).column(2).1), ["[Far]", "ssh"]);
    }

    #[test]
    fn out_of_range_column_is_empty() {
        let projection = project(&MenuTree::new(), 2);
        assert!(projection.is_empty());
        let (start, entries) = projection.column(5);
        assert_eq!(start, 0);
        assert!(entries.is_empty());
    }
}
