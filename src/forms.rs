use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::color::PaletteEntry;
use crate::menu::Item;
use crate::theme::THEME_PRESETS;

pub struct ItemRecord {
    pub label: String,
    pub cmd: String,
    pub info: String,
    pub category: String,
    pub pause: bool,
}

pub struct CategoryRecord {
    pub old_name: String,
    pub name: String,
    pub background: String,
    pub text: String,
    pub column: String,
}

pub struct PresetRecord {
    pub name: String,
    pub background: String,
    pub text: String,
}

pub struct SettingsRecord {
    pub title: String,
    pub columns: String,
    pub theme_key: String,
}

pub enum FormKeyResult<T> {
    Continue,
    Cancel,
    Submit(T),
    AddPreset(PresetRecord),
    DeletePreset(usize),
}

fn edit_text(value: &mut String, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            value.pop();
        }
        KeyCode::Delete => value.clear(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => value.push(c),
        _ => {}
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Label,
    Command,
    Description,
    Category,
    Pause,
}

pub struct ItemForm {
    pub target: Option<Item>,
    pub label: String,
    pub cmd: String,
    pub info: String,
    pub category: String,
    pub pause: bool,
    pub categories: Vec<String>,
    pub selected: ItemField,
    pub error: Option<String>,
}

impl ItemForm {
    pub fn new(categories: Vec<String>, category: String) -> Self {
        Self {
            target: None,
            label: String::new(),
            cmd: String::new(),
            info: String::new(),
            category,
            pause: false,
            categories,
            selected: ItemField::Label,
            error: None,
        }
    }

    pub fn edit(item: &Item, categories: Vec<String>) -> Self {
        Self {
            target: Some(item.clone()),
            label: item.label.clone(),
            cmd: item.cmd.clone(),
            info: item.info.clone(),
            category: item.category.clone(),
            pause: item.pause,
            categories,
            selected: ItemField::Label,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.target.is_some() {
            "Edit Menu Item"
        } else {
            "New Menu Item"
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormKeyResult<ItemRecord> {
        self.error = None;
        match key.code {
            KeyCode::Esc => return FormKeyResult::Cancel,
            KeyCode::Enter => return FormKeyResult::Submit(self.to_record()),
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.previous_field(),
            KeyCode::Char(' ') if self.selected == ItemField::Pause => self.pause = !self.pause,
            _ => {
                if let Some(value) = self.active_value_mut() {
                    edit_text(value, key);
                }
            }
        }
        FormKeyResult::Continue
    }

    fn to_record(&self) -> ItemRecord {
        ItemRecord {
            label: self.label.clone(),
            cmd: self.cmd.clone(),
            info: self.info.clone(),
            category: self.category.clone(),
            pause: self.pause,
        }
    }

    fn next_field(&mut self) {
        self.selected = match self.selected {
            ItemField::Label => ItemField::Command,
            ItemField::Command => ItemField::Description,
            ItemField::Description => ItemField::Category,
            ItemField::Category => ItemField::Pause,
            ItemField::Pause => ItemField::Label,
        };
    }

    fn previous_field(&mut self) {
        self.selected = match self.selected {
            ItemField::Label => ItemField::Pause,
            ItemField::Command => ItemField::Label,
            ItemField::Description => ItemField::Command,
            ItemField::Category => ItemField::Description,
            ItemField::Pause => ItemField::Category,
        };
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.selected {
            ItemField::Label => Some(&mut self.label),
            ItemField::Command => Some(&mut self.cmd),
            ItemField::Description => Some(&mut self.info),
            ItemField::Category => Some(&mut self.category),
            ItemField::Pause => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    Name,
    Background,
    Text,
    Column,
    Palette,
    PresetName,
}

const CATEGORY_FIELDS: [CategoryField; 6] = [
    CategoryField::Name,
    CategoryField::Background,
    CategoryField::Text,
    CategoryField::Column,
    CategoryField::Palette,
    CategoryField::PresetName,
];

pub struct CategoryForm {
    pub old_name: String,
    pub name: String,
    pub background: String,
    pub text: String,
    pub column: String,
    pub preset_name: String,
    pub palette: Vec<PaletteEntry>,
    pub custom_count: usize,
    pub palette_index: usize,
    pub selected: CategoryField,
    pub error: Option<String>,
}

impl CategoryForm {
    pub fn new(
        name: &str,
        colors: Option<(&str, &str)>,
        column: u16,
        palette: Vec<PaletteEntry>,
        custom_count: usize,
    ) -> Self {
        let (background, text) = colors.unwrap_or(("", ""));
        Self {
            old_name: name.to_string(),
            name: name.to_string(),
            background: background.to_string(),
            text: text.to_string(),
            column: column.to_string(),
            preset_name: String::new(),
            palette,
            custom_count,
            palette_index: 0,
            selected: CategoryField::Name,
            error: None,
        }
    }

    pub fn refresh_palette(&mut self, palette: Vec<PaletteEntry>, custom_count: usize) {
        self.palette = palette;
        self.custom_count = custom_count;
        self.palette_index = self.palette_index.min(self.palette.len().saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormKeyResult<CategoryRecord> {
        self.error = None;
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return FormKeyResult::Cancel,
            KeyCode::Enter => return FormKeyResult::Submit(self.to_record()),
            KeyCode::Char('a') if control => {
                return FormKeyResult::AddPreset(PresetRecord {
                    name: self.preset_name.clone(),
                    background: self.background.clone(),
                    text: self.text.clone(),
                });
            }
            KeyCode::Char('d') if control && self.selected == CategoryField::Palette => {
                if self.palette_index < self.custom_count {
                    return FormKeyResult::DeletePreset(self.palette_index);
                }
            }
            KeyCode::Tab | KeyCode::Down => self.step_field(1),
            KeyCode::BackTab | KeyCode::Up => self.step_field(CATEGORY_FIELDS.len() - 1),
            KeyCode::Left if self.selected == CategoryField::Palette => self.step_palette(false),
            KeyCode::Right if self.selected == CategoryField::Palette => self.step_palette(true),
            _ => {
                if let Some(value) = self.active_value_mut() {
                    edit_text(value, key);
                }
            }
        }
        FormKeyResult::Continue
    }

    fn to_record(&self) -> CategoryRecord {
        CategoryRecord {
            old_name: self.old_name.clone(),
            name: self.name.clone(),
            background: self.background.clone(),
            text: self.text.clone(),
            column: self.column.clone(),
        }
    }

    fn step_field(&mut self, offset: usize) {
        let current = CATEGORY_FIELDS
            .iter()
            .position(|field| *field == self.selected)
            .unwrap_or(0);
        self.selected = CATEGORY_FIELDS[(current + offset) % CATEGORY_FIELDS.len()];
    }

    fn step_palette(&mut self, forward: bool) {
        if self.palette.is_empty() {
            return;
        }
        let len = self.palette.len();
        self.palette_index = if forward {
            (self.palette_index + 1) % len
        } else {
            (self.palette_index + len - 1) % len
        };
        let entry = &self.palette[self.palette_index];
        self.background = entry.background.clone();
        self.text = entry.text.clone();
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.selected {
            CategoryField::Name => Some(&mut self.name),
            CategoryField::Background => Some(&mut self.background),
            CategoryField::Text => Some(&mut self.text),
            CategoryField::Column => Some(&mut self.column),
            CategoryField::PresetName => Some(&mut self.preset_name),
            CategoryField::Palette => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Title,
    Columns,
    Theme,
}

pub struct SettingsForm {
    pub title: String,
    pub columns: String,
    pub theme_index: usize,
    pub selected: SettingsField,
    pub error: Option<String>,
}

impl SettingsForm {
    pub fn new(title: &str, columns: u16, theme_key: &str) -> Self {
        Self {
            title: title.to_string(),
            columns: columns.to_string(),
            theme_index: THEME_PRESETS
                .iter()
                .position(|(key, _)| *key == theme_key)
                .unwrap_or(0),
            selected: SettingsField::Title,
            error: None,
        }
    }

    pub fn theme_key(&self) -> &'static str {
        THEME_PRESETS[self.theme_index % THEME_PRESETS.len()].0
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormKeyResult<SettingsRecord> {
        self.error = None;
        match key.code {
            KeyCode::Esc => return FormKeyResult::Cancel,
            KeyCode::Enter => {
                return FormKeyResult::Submit(SettingsRecord {
                    title: self.title.clone(),
                    columns: self.columns.clone(),
                    theme_key: self.theme_key().to_string(),
                });
            }
            KeyCode::Tab | KeyCode::Down => {
                self.selected = match self.selected {
                    SettingsField::Title => SettingsField::Columns,
                    SettingsField::Columns => SettingsField::Theme,
                    SettingsField::Theme => SettingsField::Title,
                };
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.selected = match self.selected {
                    SettingsField::Title => SettingsField::Theme,
                    SettingsField::Columns => SettingsField::Title,
                    SettingsField::Theme => SettingsField::Columns,
                };
            }
            KeyCode::Left | KeyCode::Right if self.selected == SettingsField::Theme => {
                let len = THEME_PRESETS.len();
                self.theme_index = if key.code == KeyCode::Right {
                    (self.theme_index + 1) % len
                } else {
                    (self.theme_index + len - 1) % len
                };
            }
            _ => match self.selected {
                SettingsField::Title => edit_text(&mut self.title, key),
                SettingsField::Columns => edit_text(&mut self.columns, key),
                SettingsField::Theme => {}
            },
        }
        FormKeyResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::builtin_palette;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text<T>(handle: &mut dyn FnMut(KeyEvent) -> FormKeyResult<T>, text: &str) {
        for c in text.chars() {
            handle(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn item_form_collects_fields() {
        let mut form = ItemForm::new(vec!["Tools".into()], "Tools".into());
        type_text(&mut |k| form.handle_key(k), "Top");
        form.handle_key(press(KeyCode::Tab));
        type_text(&mut |k| form.handle_key(k), "top");
        form.handle_key(press(KeyCode::BackTab));
        form.handle_key(press(KeyCode::Up));
        form.handle_key(press(KeyCode::Char(' ')));
        assert!(form.pause);

        match form.handle_key(press(KeyCode::Enter)) {
            FormKeyResult::Submit(record) => {
                assert_eq!(record.label, "Top");
                assert_eq!(record.cmd, "top");
                assert_eq!(record.category, "Tools");
                assert!(record.pause);
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn category_palette_fills_both_colors() {
        let mut form = CategoryForm::new("Tools", None, 1, builtin_palette(), 0);
        for _ in 0..4 {
            form.handle_key(press(KeyCode::Tab));
        }
        assert!(form.selected == CategoryField::Palette);
        form.handle_key(press(KeyCode::Right));
        assert_eq!(form.background, "#6f1d1b");
        assert_eq!(form.text, "#ffe5d9");
        form.handle_key(press(KeyCode::Left));
        form.handle_key(press(KeyCode::Left));
        assert_eq!(form.background, "#2b2d42");
    }

    #[test]
    fn only_custom_palette_entries_can_be_deleted() {
        let mut form = CategoryForm::new("Tools", None, 1, builtin_palette(), 1);
        form.selected = CategoryField::Palette;
        let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert!(matches!(form.handle_key(ctrl_d), FormKeyResult::DeletePreset(0)));
        form.handle_key(press(KeyCode::Right));
        assert!(matches!(form.handle_key(ctrl_d), FormKeyResult::Continue));
    }

    #[test]
    fn settings_form_cycles_themes() {
        let mut form = SettingsForm::new("Menu", 2, "nord");
        assert_eq!(form.theme_key(), "nord");
        form.selected = SettingsField::Theme;
        form.handle_key(press(KeyCode::Left));
        form.handle_key(press(KeyCode::Left));
        assert_eq!(form.theme_key(), "monokai");
        match form.handle_key(press(KeyCode::Enter)) {
            FormKeyResult::Submit(record) => {
                assert_eq!(record.columns, "2");
                assert_eq!(record.theme_key, "monokai");
            }
            _ => panic!("expected submit"),
        }
    }
}
