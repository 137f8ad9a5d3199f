use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::AppPaths;
use crate::error::MenuError;
use crate::forms::{
    CategoryForm, CategoryRecord, FormKeyResult, ItemForm, ItemRecord, PresetRecord, SettingsForm,
    SettingsRecord,
};
use crate::menu::model::{clamp_columns, Item};
use crate::menu::store::FALLBACK_CATEGORY;
use crate::menu::{project, Anchor, Cursor, FlatEntry, JsonFile, MenuStore, Projection};
use crate::theme::Theme;

pub struct PendingCommand {
    pub command: String,
    pub pause: bool,
}

#[derive(Clone)]
pub struct InfoPopup {
    pub label: String,
    pub command: String,
    pub category: String,
    pub description: String,
}

pub enum PopupState {
    Info(InfoPopup),
    ItemForm(ItemForm),
    CategoryForm(CategoryForm),
    SettingsForm(SettingsForm),
}

enum PopupResult {
    None,
    Close(Option<String>),
    ItemSubmit(ItemRecord),
    CategorySubmit(CategoryRecord),
    AddPreset(PresetRecord),
    DeletePreset(usize),
    SettingsSubmit(SettingsRecord),
}

impl<T> FormKeyResult<T> {
    fn into_popup_result(
        self,
        cancelled: &str,
        submit: impl FnOnce(T) -> PopupResult,
    ) -> PopupResult {
        match self {
            FormKeyResult::Continue => PopupResult::None,
            FormKeyResult::Cancel => PopupResult::Close(Some(cancelled.to_string())),
            FormKeyResult::Submit(record) => submit(record),
            FormKeyResult::AddPreset(preset) => PopupResult::AddPreset(preset),
            FormKeyResult::DeletePreset(index) => PopupResult::DeletePreset(index),
        }
    }
}

pub struct AppState {
    pub store: MenuStore,
    pub projection: Projection,
    pub cursor: Cursor,
    pub theme: Theme,
    pub paths: AppPaths,
    pub status_message: Option<String>,
    pub active_popup: Option<PopupState>,
    pub should_quit: bool,
    pending_command: Option<PendingCommand>,
}

impl AppState {
    pub fn new(paths: AppPaths) -> Self {
        let store = MenuStore::load(Box::new(JsonFile::new(paths.menu_file.clone())));
        let theme = Theme::load(&paths.theme_file);
        Self::with_store(store, theme, paths)
    }

    pub fn with_store(store: MenuStore, theme: Theme, paths: AppPaths) -> Self {
        let mut app = AppState {
            store,
            projection: Projection::default(),
            cursor: Cursor::default(),
            theme,
            paths,
            status_message: None,
            active_popup: None,
            should_quit: false,
            pending_command: None,
        };
        app.refresh(&Anchor::Clamp);
        app
    }

    fn refresh(&mut self, anchor: &Anchor) {
        self.projection = project(self.store.tree(), self.store.column_count());
        self.cursor.apply(anchor, self.projection.flat());
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.cursor.index(self.projection.flat())
    }

    pub fn selected_entry(&self) -> Option<&FlatEntry> {
        self.selected_index()
            .and_then(|index| self.projection.get(index))
    }

    fn selected_item(&self) -> Option<Item> {
        match self.selected_entry() {
            Some(FlatEntry::MenuItem { item }) => Some(item.clone()),
            _ => None,
        }
    }

    fn current_anchor(&self) -> Anchor {
        match self.selected_entry() {
            Some(FlatEntry::CategoryHeader { name }) => Anchor::Category(name.clone()),
            Some(FlatEntry::MenuItem { item }) => Anchor::Item {
                label: item.label.clone(),
                cmd: item.cmd.clone(),
            },
            None => Anchor::Clamp,
        }
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status_message = message;
    }

    pub fn status_text(&self) -> String {
        let total = self.projection.len();
        let current = self.selected_index().map_or(0, |index| index + 1);
        let mut text = format!("Item {}/{} | Theme: {}", current, total, self.theme.name);
        if let Some(msg) = &self.status_message {
            text.push_str(" | ");
            text.push_str(msg);
        }
        text
    }

    pub fn take_pending_command(&mut self) -> Option<PendingCommand> {
        self.pending_command.take()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.active_popup.is_some() {
            self.handle_popup_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.cursor.move_up(self.projection.flat()),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.move_down(self.projection.flat()),
            KeyCode::Enter => self.activate_current_entry(),
            KeyCode::Char(' ') => self.toggle_selected_category(),
            KeyCode::Char('r') => self.reload_from_disk(),
            KeyCode::Char('i') => self.show_info_popup(),
            KeyCode::Char('n') => self.open_new_item_form(),
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char('d') => self.delete_selected_item(),
            KeyCode::Char('s') => self.open_settings_form(),
            KeyCode::Char('b') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.run_bin_scan()
            }
            _ => {}
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.active_popup.as_mut() else {
            return;
        };
        let result = match popup {
            PopupState::Info(_) => match key.code {
                KeyCode::Esc | KeyCode::Enter => PopupResult::Close(None),
                _ => PopupResult::None,
            },
            PopupState::ItemForm(form) => form
                .handle_key(key)
                .into_popup_result("Item edit cancelled", PopupResult::ItemSubmit),
            PopupState::CategoryForm(form) => form
                .handle_key(key)
                .into_popup_result("Category edit cancelled", PopupResult::CategorySubmit),
            PopupState::SettingsForm(form) => form
                .handle_key(key)
                .into_popup_result("Settings update cancelled", PopupResult::SettingsSubmit),
        };

        let outcome = match result {
            PopupResult::None => return,
            PopupResult::Close(status) => {
                self.active_popup = None;
                if status.is_some() {
                    self.set_status(status);
                }
                return;
            }
            PopupResult::ItemSubmit(record) => self.apply_item_record(record),
            PopupResult::CategorySubmit(record) => self.apply_category_record(record),
            PopupResult::SettingsSubmit(record) => self.apply_settings_record(record),
            PopupResult::AddPreset(preset) => {
                self.add_color_preset(preset);
                return;
            }
            PopupResult::DeletePreset(index) => {
                self.delete_color_preset(index);
                return;
            }
        };
        match outcome {
            Ok(msg) => {
                self.active_popup = None;
                if msg.is_some() {
                    self.set_status(msg);
                }
            }
            Err(err) => self.set_form_error(err),
        }
    }

    fn set_form_error(&mut self, err: String) {
        match self.active_popup.as_mut() {
            Some(PopupState::ItemForm(form)) => form.error = Some(err),
            Some(PopupState::CategoryForm(form)) => form.error = Some(err),
            Some(PopupState::SettingsForm(form)) => form.error = Some(err),
            _ => {}
        }
    }

    fn activate_current_entry(&mut self) {
        match self.selected_entry() {
            Some(FlatEntry::CategoryHeader { .. }) => self.toggle_selected_category(),
            Some(FlatEntry::MenuItem { item }) => {
                if item.cmd.trim().is_empty() {
                    return;
                }
                let pending = PendingCommand {
                    command: item.cmd.clone(),
                    pause: item.pause,
                };
                let status = format!("Running {}", item.label);
                self.pending_command = Some(pending);
                self.set_status(Some(status));
            }
            None => {}
        }
    }

    fn toggle_selected_category(&mut self) {
        let Some(FlatEntry::CategoryHeader { name }) = self.selected_entry() else {
            return;
        };
        let name = name.clone();
        if let Some(anchor) = self.store.toggle_category_expansion(&name) {
            self.refresh(&anchor);
        }
    }

    fn reload_from_disk(&mut self) {
        self.store.reload();
        self.theme = Theme::load(&self.paths.theme_file);
        self.refresh(&Anchor::Clamp);
        self.set_status(Some("Configuration reloaded".into()));
    }

    fn show_info_popup(&mut self) {
        if let Some(item) = self.selected_item() {
            self.active_popup = Some(PopupState::Info(InfoPopup {
                label: item.label,
                command: item.cmd,
                category: item.category,
                description: item.info,
            }));
        }
    }

    fn open_new_item_form(&mut self) {
        let category = self
            .selected_entry()
            .map(|entry| entry.category_name().to_string())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
        let form = ItemForm::new(self.store.tree().names(), category);
        self.active_popup = Some(PopupState::ItemForm(form));
    }

    fn open_edit_form(&mut self) {
        let popup = match self.selected_entry() {
            Some(FlatEntry::MenuItem { item }) => {
                PopupState::ItemForm(ItemForm::edit(item, self.store.tree().names()))
            }
            Some(FlatEntry::CategoryHeader { name }) => {
                let Some(category) = self.store.tree().get(name) else {
                    return;
                };
                let colors = category
                    .colors
                    .as_ref()
                    .map(|pair| (pair.background.as_str(), pair.text.as_str()));
                PopupState::CategoryForm(CategoryForm::new(
                    &category.name,
                    colors,
                    category.column,
                    self.store.palette(),
                    self.store.custom_colors().len(),
                ))
            }
            None => return,
        };
        self.active_popup = Some(popup);
    }

    fn open_settings_form(&mut self) {
        let settings = self.store.settings();
        let form = SettingsForm::new(&settings.title, settings.columns, &self.theme.key);
        self.active_popup = Some(PopupState::SettingsForm(form));
    }

    fn delete_selected_item(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        if self.store.delete_item(&item) {
            self.refresh(&Anchor::Clamp);
            self.set_status(Some("Item deleted".into()));
        }
    }

    fn run_bin_scan(&mut self) {
        let source = self.paths.import_dir.clone();
        let managed = self.paths.bin_dir.clone();
        let added = self.store.scan_directory(&source, &managed);
        self.refresh(&Anchor::Clamp);
        let status = match added.len() {
            0 => format!("No new executables in {}", source.display()),
            1 => format!("Imported {}", added[0].label),
            n => format!("Imported {n} executables"),
        };
        self.set_status(Some(status));
    }

    fn apply_item_record(&mut self, record: ItemRecord) -> Result<Option<String>, String> {
        let label = record.label.trim();
        if label.is_empty() {
            return Err(MenuError::MissingField("Label").to_string());
        }
        let command = record.cmd.trim();
        if command.is_empty() {
            return Err(MenuError::MissingField("Command").to_string());
        }
        let item = Item {
            label: label.to_string(),
            cmd: command.to_string(),
            info: record.info.trim().to_string(),
            category: record.category.trim().to_string(),
            pause: record.pause,
        };

        let target = match self.active_popup.as_ref() {
            Some(PopupState::ItemForm(form)) => form.target.clone(),
            _ => None,
        };
        match target {
            Some(old) => match self.store.update_item(&old, item) {
                Some(anchor) => {
                    self.refresh(&anchor);
                    Ok(Some("Item updated".into()))
                }
                None => Ok(None),
            },
            None => {
                let anchor = self.store.add_item(item);
                self.refresh(&anchor);
                Ok(Some("Item added".into()))
            }
        }
    }

    fn apply_category_record(
        &mut self,
        record: CategoryRecord,
    ) -> Result<Option<String>, String> {
        let column = match record.column.trim() {
            "" => None,
            value => Some(clamp_columns(
                value
                    .parse::<i64>()
                    .map_err(|_| MenuError::InvalidColumns(value.to_string()).to_string())?,
            )),
        };
        let background = record.background.trim();
        let text = record.text.trim();
        let colors = if background.is_empty() && text.is_empty() {
            None
        } else {
            Some((background, text))
        };

        match self
            .store
            .rename_or_recolor_category(&record.old_name, &record.name, colors, column)
        {
            Ok(Some(anchor)) => {
                self.refresh(&anchor);
                Ok(Some("Category updated".into()))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(err.to_string()),
        }
    }

    fn apply_settings_record(
        &mut self,
        record: SettingsRecord,
    ) -> Result<Option<String>, String> {
        let columns = record.columns.trim();
        let columns = columns
            .parse::<i64>()
            .map_err(|_| MenuError::InvalidColumns(columns.to_string()).to_string())?;

        let anchor = self.current_anchor();
        self.store.set_title(&record.title);
        self.store.set_column_count(columns);
        if record.theme_key != self.theme.key {
            self.apply_theme(&record.theme_key);
        }
        self.refresh(&anchor);
        Ok(Some("Settings updated".into()))
    }

    pub fn apply_theme(&mut self, key: &str) {
        self.theme = Theme::from_key(key);
        if let Err(err) = self.theme.save(&self.paths.theme_file) {
            log::warn!("failed to save theme: {err:#}");
        }
    }

    fn add_color_preset(&mut self, preset: PresetRecord) {
        let result =
            self.store
                .add_custom_color(&preset.name, preset.background.trim(), preset.text.trim());
        match result {
            Ok(added) => {
                self.refresh_form_palette();
                self.set_status(Some(if added {
                    "Color preset added".into()
                } else {
                    "Color preset already exists".into()
                }));
            }
            Err(err) => self.set_form_error(err.to_string()),
        }
    }

    fn delete_color_preset(&mut self, index: usize) {
        if self.store.remove_custom_color(index) {
            self.refresh_form_palette();
            self.set_status(Some("Color preset deleted".into()));
        }
    }

    fn refresh_form_palette(&mut self) {
        let palette = self.store.palette();
        let custom_count = self.store.custom_colors().len();
        if let Some(PopupState::CategoryForm(form)) = self.active_popup.as_mut() {
            form.refresh_palette(palette, custom_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::storage::memory::MemoryStorage;
    use crate::theme::DEFAULT_THEME_KEY;
    use std::path::Path;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
    }

    fn app_in(dir: &Path, storage: &MemoryStorage) -> AppState {
        let paths = AppPaths::in_dir(dir, dir.join("drop"));
        let store = MenuStore::load(Box::new(storage.clone()));
        AppState::with_store(store, Theme::from_key(DEFAULT_THEME_KEY), paths)
    }

    #[test]
    fn default_menu_status_line() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = app_in(tmp.path(), &MemoryStorage::default());
        assert_eq!(app.projection.len(), 2);
        assert_eq!(app.status_text(), "Item 1/2 | Theme: Classic Teal");
    }

    #[test]
    fn enter_on_item_queues_its_command() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(press(KeyCode::Char('j')));
        app.handle_key(press(KeyCode::Enter));

        let pending = app.take_pending_command().expect("pending command");
        assert_eq!(pending.command, "htop");
        assert!(!pending.pause);
        assert!(app.take_pending_command().is_none());
        assert!(app.status_text().ends_with("Running System Monitor"));
    }

    #[test]
    fn enter_on_header_collapses_and_keeps_cursor() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = MemoryStorage::default();
        let mut app = app_in(tmp.path(), &storage);
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.projection.len(), 1);
        assert_eq!(app.selected_index(), Some(0));
        assert_eq!(storage.json()["categories"]["System Tools"]["expanded"], false);
    }

    #[test]
    fn new_item_form_adds_to_selected_category() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(press(KeyCode::Char('n')));
        type_text(&mut app, "Disk");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "df -h");
        app.handle_key(press(KeyCode::Enter));

        assert!(app.active_popup.is_none());
        let items = &app.store.tree().get("System Tools").expect("category").items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].cmd, "df -h");
        assert!(app.status_text().ends_with("Item added"));
    }

    #[test]
    fn missing_command_keeps_form_open() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = MemoryStorage::default();
        let mut app = app_in(tmp.path(), &storage);
        app.handle_key(press(KeyCode::Char('n')));
        type_text(&mut app, "Nothing");
        app.handle_key(press(KeyCode::Enter));

        match app.active_popup.as_ref() {
            Some(PopupState::ItemForm(form)) => {
                assert_eq!(form.error.as_deref(), Some("Command is required."))
            }
            _ => panic!("item form should stay open"),
        }
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn editing_item_into_new_category_follows_it() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Char('e')));
        for _ in 0..3 {
            app.handle_key(press(KeyCode::Tab));
        }
        if let Some(PopupState::ItemForm(form)) = app.active_popup.as_mut() {
            form.category.clear();
        }
        type_text(&mut app, "Monitors");
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.store.tree().names(), ["Monitors"]);
        match app.selected_entry() {
            Some(FlatEntry::MenuItem { item }) => assert_eq!(item.cmd, "htop"),
            other => panic!("cursor should follow the item, got {other:?}"),
        }
    }

    #[test]
    fn editing_a_vanished_item_closes_form_quietly() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = MemoryStorage::default();
        let mut app = app_in(tmp.path(), &storage);
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Char('e')));
        app.store.add_item(Item::new("Keep", "true", "", "System Tools"));
        let target = app.selected_item().expect("selected item");
        assert!(app.store.delete_item(&target));
        let writes = storage.writes();

        app.handle_key(press(KeyCode::Enter));

        assert!(app.active_popup.is_none());
        assert!(app.status_message.is_none());
        assert_eq!(storage.writes(), writes);
        assert_eq!(app.store.tree().items().count(), 1);
    }

    #[test]
    fn editing_a_vanished_category_closes_form_quietly() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(press(KeyCode::Char('e')));
        if let Some(PopupState::CategoryForm(form)) = app.active_popup.as_mut() {
            form.old_name = "Gone".into();
        }
        app.handle_key(press(KeyCode::Enter));

        assert!(app.active_popup.is_none());
        assert!(app.status_message.is_none());
        assert_eq!(app.store.tree().names(), ["System Tools"]);
    }

    #[test]
    fn category_rename_collision_is_reported_in_form() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.store.add_item(Item::new("Shell", "bash", "", "Shells"));
        app.refresh(&Anchor::Clamp);

        app.handle_key(press(KeyCode::Char('e')));
        if let Some(PopupState::CategoryForm(form)) = app.active_popup.as_mut() {
            form.name = "Shells".into();
        }
        app.handle_key(press(KeyCode::Enter));

        match app.active_popup.as_ref() {
            Some(PopupState::CategoryForm(form)) => assert_eq!(
                form.error.as_deref(),
                Some("Another category already uses the name 'Shells'.")
            ),
            _ => panic!("category form should stay open"),
        }
        assert!(app.store.tree().contains("System Tools"));
    }

    #[test]
    fn category_form_adds_custom_preset() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        let before = app.store.custom_colors().len();
        app.handle_key(press(KeyCode::Char('e')));
        if let Some(PopupState::CategoryForm(form)) = app.active_popup.as_mut() {
            form.background = "#123456".into();
            form.text = "#abcdef".into();
            form.preset_name = "Mine".into();
        }
        app.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL));

        assert_eq!(app.store.custom_colors().len(), before + 1);
        match app.active_popup.as_ref() {
            Some(PopupState::CategoryForm(form)) => {
                assert_eq!(form.custom_count, before + 1);
                assert!(form.palette.iter().any(|entry| entry.name == "Mine"));
            }
            _ => panic!("category form should stay open"),
        }
    }

    #[test]
    fn settings_update_columns_and_theme() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = MemoryStorage::default();
        let mut app = app_in(tmp.path(), &storage);
        app.handle_key(press(KeyCode::Char('s')));
        if let Some(PopupState::SettingsForm(form)) = app.active_popup.as_mut() {
            form.columns = "9".into();
            form.theme_index = 2;
        }
        app.handle_key(press(KeyCode::Enter));

        assert!(app.active_popup.is_none());
        assert_eq!(app.store.column_count(), 6);
        assert_eq!(app.theme.key, "gruvbox");
        let record = std::fs::read_to_string(&app.paths.theme_file).expect("theme record");
        assert!(record.contains("\"skin\": \"gruvbox\""));
        assert_eq!(storage.json()["app_settings"]["columns"], 6);
    }

    #[test]
    fn settings_reject_non_numeric_columns() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(press(KeyCode::Char('s')));
        if let Some(PopupState::SettingsForm(form)) = app.active_popup.as_mut() {
            form.columns = "two".into();
        }
        app.handle_key(press(KeyCode::Enter));
        assert!(matches!(
            app.active_popup,
            Some(PopupState::SettingsForm(ref form)) if form.error.is_some()
        ));
        assert_eq!(app.store.column_count(), 1);
    }

    #[test]
    fn deleting_last_item_removes_category() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(press(KeyCode::Char('j')));
        app.handle_key(press(KeyCode::Char('d')));

        assert!(app.store.tree().is_empty());
        assert!(app.projection.is_empty());
        assert_eq!(app.selected_index(), None);
        assert!(app.status_text().starts_with("Item 0/0"));
    }

    #[test]
    fn scan_with_empty_drop_directory_reports_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::CONTROL));
        assert!(app.status_text().contains("No new executables"));
        assert_eq!(app.projection.len(), 2);
    }

    #[test]
    fn quit_keys() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(tmp.path(), &MemoryStorage::default());
        app.handle_key(press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
