use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::model::{clamp_columns, AppSettings, Category, Item, MenuTree, DEFAULT_TITLE};
use crate::color::{builtin_palette, sanitize_color_pair, ColorPair, PaletteEntry};

pub trait MenuStorage {
    /// Returns `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;
    fn write(&mut self, contents: &str) -> Result<()>;
}

pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MenuStorage for JsonFile {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(Some(data))
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents).with_context(|| format!("writing {}", self.path.display()))
    }
}

#[derive(Serialize, Deserialize)]
pub struct MenuFile {
    categories: CategoryMap,
    #[serde(default)]
    app_settings: SettingsRecord,
    #[serde(default)]
    custom_colors: Vec<PaletteRecord>,
}

struct CategoryMap(Vec<(String, CategoryRecord)>);

impl Serialize for CategoryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, record) in &self.0 {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CategoryMapVisitor;

        impl<'de> Visitor<'de> for CategoryMapVisitor {
            type Value = CategoryMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category names to categories")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<CategoryMap, A::Error> {
                let mut entries: Vec<(String, CategoryRecord)> = Vec::new();
                while let Some((name, record)) = access.next_entry::<String, CategoryRecord>()? {
                    if entries.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!("duplicate category '{name}'")));
                    }
                    entries.push((name, record));
                }
                Ok(CategoryMap(entries))
            }
        }

        deserializer.deserialize_map(CategoryMapVisitor)
    }
}

#[derive(Serialize, Deserialize)]
struct CategoryRecord {
    #[serde(default = "default_true")]
    expanded: bool,
    #[serde(default)]
    column: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    colors: Option<ColorRecord>,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Serialize, Deserialize)]
struct ColorRecord {
    #[serde(default)]
    background: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct PaletteRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    background: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct SettingsRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    columns: Option<Value>,
}

fn default_true() -> bool {
    true
}

fn stored_as_integer(value: Option<&Value>) -> bool {
    value.map_or(true, |value| value.is_i64() || value.is_u64())
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct LoadedMenu {
    pub tree: MenuTree,
    pub settings: AppSettings,
    pub custom_colors: Vec<PaletteEntry>,
    pub repaired: bool,
}

impl MenuFile {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_state(
        tree: &MenuTree,
        settings: &AppSettings,
        custom_colors: &[PaletteEntry],
    ) -> Self {
        let categories = tree
            .iter()
            .map(|category| {
                let record = CategoryRecord {
                    expanded: category.expanded,
                    column: Some(Value::from(category.column)),
                    colors: category.colors.as_ref().map(|pair| ColorRecord {
                        background: Some(pair.background.clone()),
                        text: Some(pair.text.clone()),
                    }),
                    items: category.items.clone(),
                };
                (category.name.clone(), record)
            })
            .collect();
        MenuFile {
            categories: CategoryMap(categories),
            app_settings: SettingsRecord {
                title: Some(settings.title.clone()),
                columns: Some(Value::from(settings.columns)),
            },
            custom_colors: custom_colors
                .iter()
                .map(|entry| PaletteRecord {
                    name: Some(entry.name.clone()),
                    background: Some(entry.background.clone()),
                    text: Some(entry.text.clone()),
                })
                .collect(),
        }
    }

    pub fn into_state(self) -> LoadedMenu {
        let mut repaired = false;

        let raw_columns = self.app_settings.columns.as_ref().and_then(integer_value);
        let columns = clamp_columns(raw_columns.unwrap_or(1));
        if raw_columns.is_some_and(|raw| raw != i64::from(columns))
            || !stored_as_integer(self.app_settings.columns.as_ref())
        {
            repaired = true;
        }
        let settings = AppSettings {
            title: self
                .app_settings
                .title
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            columns,
        };

        let mut tree = MenuTree::new();
        for (name, record) in self.categories.0 {
            let stored_column = record.column.as_ref().and_then(integer_value).unwrap_or(1);
            let column = stored_column.clamp(1, i64::from(columns)) as u16;
            if i64::from(column) != stored_column
                || !stored_as_integer(record.column.as_ref())
            {
                repaired = true;
            }

            let colors = record.colors.and_then(|colors| {
                let pair = match (colors.background.as_deref(), colors.text.as_deref()) {
                    (Some(bg), Some(text)) => sanitize_color_pair(bg, text),
                    _ => None,
                };
                if pair.as_ref().map(|p| (Some(&p.background), Some(&p.text)))
                    != Some((colors.background.as_ref(), colors.text.as_ref()))
                {
                    repaired = true;
                }
                pair
            });

            let mut items = record.items;
            for item in &mut items {
                if item.category != name {
                    item.category = name.clone();
                    repaired = true;
                }
            }
            if items.is_empty() {
                repaired = true;
                continue;
            }

            tree.insert(Category {
                name,
                expanded: record.expanded,
                column,
                colors,
                items,
            });
        }

        let mut custom_colors = Vec::new();
        for (idx, record) in self.custom_colors.into_iter().enumerate() {
            let pair: Option<ColorPair> = match (&record.background, &record.text) {
                (Some(bg), Some(text)) => sanitize_color_pair(bg, text),
                _ => None,
            };
            let Some(pair) = pair else {
                repaired = true;
                continue;
            };
            let name = record
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("Color {}", idx + 1));
            custom_colors.push(PaletteEntry::new(name, &pair.background, &pair.text));
        }
        if custom_colors.is_empty() {
            custom_colors = builtin_palette();
        }

        LoadedMenu {
            tree,
            settings,
            custom_colors,
            repaired,
        }
    }
}
