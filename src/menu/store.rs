use super::cursor::Anchor;
use super::model::{clamp_columns, AppSettings, Item, MenuTree};
use super::storage::{MenuFile, MenuStorage};
use crate::color::{
    build_palette, builtin_palette, sanitize_color_pair, PaletteEntry, MIN_PALETTE_ENTRIES,
};
use crate::error::MenuError;

pub const FALLBACK_CATEGORY: &str = "General";

/// Owner of the category tree. Every mutation either applies completely and
/// is written through to storage, or leaves the tree untouched.
pub struct MenuStore {
    storage: Box<dyn MenuStorage>,
    tree: MenuTree,
    settings: AppSettings,
    custom_colors: Vec<PaletteEntry>,
}

impl MenuStore {
    /// Loads the menu, falling back to the default tree on a missing file,
    /// unreadable content or structural errors. Fallbacks and repaired drift
    /// are written back immediately.
    pub fn load(storage: Box<dyn MenuStorage>) -> Self {
        let mut store = MenuStore {
            storage,
            tree: MenuTree::new(),
            settings: AppSettings::default(),
            custom_colors: Vec::new(),
        };
        store.reload();
        store
    }

    pub fn reload(&mut self) {
        let loaded = match self.storage.read() {
            Ok(Some(data)) => match MenuFile::parse(&data) {
                Ok(file) => Some(file.into_state()),
                Err(err) => {
                    log::warn!("menu file is corrupt, starting from defaults: {err:#}");
                    None
                }
            },
            Ok(None) => {
                log::info!("no menu file yet, creating the default menu");
                None
            }
            Err(err) => {
                log::warn!("menu file unreadable, starting from defaults: {err:#}");
                None
            }
        };

        match loaded {
            Some(loaded) => {
                self.tree = loaded.tree;
                self.settings = loaded.settings;
                self.custom_colors = loaded.custom_colors;
                if loaded.repaired {
                    log::info!("repaired menu drift on load");
                    self.persist();
                }
            }
            None => {
                self.tree = MenuTree::default_tree();
                self.settings = AppSettings::default();
                self.custom_colors = builtin_palette();
                self.persist();
            }
        }
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn column_count(&self) -> u16 {
        self.settings.columns
    }

    pub fn custom_colors(&self) -> &[PaletteEntry] {
        &self.custom_colors
    }

    pub fn palette(&self) -> Vec<PaletteEntry> {
        build_palette(&self.custom_colors, &builtin_palette(), MIN_PALETTE_ENTRIES)
    }

    fn persist(&mut self) -> bool {
        let file = MenuFile::from_state(&self.tree, &self.settings, &self.custom_colors);
        let result = file.to_json().and_then(|json| self.storage.write(&json));
        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to save menu: {err:#}");
                false
            }
        }
    }

    fn commit(&mut self) {
        self.tree.purge_empty();
        debug_assert_eq!(self.tree.check_invariants(self.settings.columns), Ok(()));
        self.persist();
    }

    pub fn add_item(&mut self, mut item: Item) -> Anchor {
        if item.category.trim().is_empty() {
            item.category = FALLBACK_CATEGORY.to_string();
        }
        self.tree.ensure(&item.category).items.push(item);
        self.commit();
        Anchor::Clamp
    }

    /// Moves the item matching `old` by `(label, cmd)` out of `old.category`
    /// and appends `new` to `new.category`. A miss changes nothing.
    pub fn update_item(&mut self, old: &Item, mut new: Item) -> Option<Anchor> {
        let category = self.tree.get_mut(&old.category)?;
        let position = category
            .items
            .iter()
            .position(|item| item.matches(&old.label, &old.cmd))?;
        category.items.remove(position);

        if new.category.trim().is_empty() {
            new.category = old.category.clone();
        }
        let anchor = Anchor::Item {
            label: new.label.clone(),
            cmd: new.cmd.clone(),
        };
        self.tree.ensure(&new.category).items.push(new);
        self.commit();
        Some(anchor)
    }

    pub fn delete_item(&mut self, item: &Item) -> bool {
        let Some(category) = self.tree.get_mut(&item.category) else {
            return false;
        };
        let Some(position) = category.items.iter().position(|existing| existing == item) else {
            return false;
        };
        category.items.remove(position);
        self.commit();
        true
    }

    pub fn rename_or_recolor_category(
        &mut self,
        old_name: &str,
        new_name: &str,
        colors: Option<(&str, &str)>,
        column: Option<u16>,
    ) -> Result<Option<Anchor>, MenuError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(MenuError::BlankCategoryName);
        }
        if !self.tree.contains(old_name) {
            return Ok(None);
        }
        if new_name != old_name && self.tree.contains(new_name) {
            return Err(MenuError::CategoryExists(new_name.to_string()));
        }
        let colors = match colors {
            Some((background, text)) => Some(sanitize_color_pair(background, text).ok_or_else(
                || MenuError::InvalidColor(format!("{background} / {text}")),
            )?),
            None => None,
        };

        let columns = self.settings.columns;
        let Some(category) = self.tree.get_mut(old_name) else {
            return Ok(None);
        };
        category.column = column.unwrap_or(category.column).clamp(1, columns);
        category.colors = colors;
        if new_name != old_name {
            category.name = new_name.to_string();
            for item in &mut category.items {
                item.category = new_name.to_string();
            }
        }
        self.commit();
        Ok(Some(Anchor::Category(new_name.to_string())))
    }

    pub fn toggle_category_expansion(&mut self, name: &str) -> Option<Anchor> {
        let category = self.tree.get_mut(name)?;
        category.expanded = !category.expanded;
        self.commit();
        Some(Anchor::Category(name.to_string()))
    }

    pub fn set_column_count(&mut self, count: i64) -> bool {
        let columns = clamp_columns(count);
        let count_changed = columns != self.settings.columns;
        self.settings.columns = columns;
        let categories_changed = self.tree.clamp_columns(columns);
        if count_changed || categories_changed {
            self.commit();
        }
        count_changed || categories_changed
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() || title == self.settings.title {
            return false;
        }
        self.settings.title = title.to_string();
        self.commit();
        true
    }

    pub fn add_custom_color(
        &mut self,
        name: &str,
        background: &str,
        text: &str,
    ) -> Result<bool, MenuError> {
        let pair = sanitize_color_pair(background, text)
            .ok_or_else(|| MenuError::InvalidColor(format!("{background} / {text}")))?;
        if self
            .custom_colors
            .iter()
            .any(|entry| pair.same_pair(&entry.background, &entry.text))
        {
            return Ok(false);
        }
        let name = match name.trim() {
            "" => format!("Custom {}", self.custom_colors.len() + 1),
            trimmed => trimmed.to_string(),
        };
        self.custom_colors
            .push(PaletteEntry::new(name, &pair.background, &pair.text));
        self.commit();
        Ok(true)
    }

    pub fn remove_custom_color(&mut self, index: usize) -> bool {
        if index >= self.custom_colors.len() {
            return false;
        }
        self.custom_colors.remove(index);
        self.commit();
        true
    }
}
