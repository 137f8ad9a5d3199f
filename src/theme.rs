use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::color::color_from_hex;

pub const DEFAULT_THEME_KEY: &str = "classic";

pub struct ThemeDefinition {
    pub name: &'static str,
    pub primary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
}

pub const THEME_PRESETS: &[(&str, ThemeDefinition)] = &[
    (
        "classic",
        ThemeDefinition {
            name: "Classic Teal",
            primary: "#00b4d8",
            accent: "#00f5ff",
            background: "#034e68",
            surface: "#023047",
            text: "#caf0f8",
        },
    ),
    (
        "nord",
        ThemeDefinition {
            name: "Nord Theme",
            primary: "#5e81ac",
            accent: "#88c0d0",
            background: "#2e3440",
            surface: "#3b4252",
            text: "#eceff4",
        },
    ),
    (
        "gruvbox",
        ThemeDefinition {
            name: "Gruvbox Dark",
            primary: "#d79921",
            accent: "#fabd2f",
            background: "#282828",
            surface: "#3c3836",
            text: "#fbf1c7",
        },
    ),
    (
        "dracula",
        ThemeDefinition {
            name: "Dracula",
            primary: "#bd93f9",
            accent: "#ff79c6",
            background: "#282a36",
            surface: "#44475a",
            text: "#f8f8f2",
        },
    ),
    (
        "monokai",
        ThemeDefinition {
            name: "Monokai",
            primary: "#a6e22e",
            accent: "#f92672",
            background: "#272822",
            surface: "#383830",
            text: "#f8f8f2",
        },
    ),
];

fn definition(key: &str) -> Option<&'static ThemeDefinition> {
    THEME_PRESETS
        .iter()
        .find(|(preset_key, _)| *preset_key == key)
        .map(|(_, def)| def)
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub key: String,
    pub name: String,
    pub primary: Color,
    pub accent: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
}

impl Theme {
    pub fn from_key(key: &str) -> Self {
        let (key, def) = match definition(key) {
            Some(def) => (key, def),
            None => (DEFAULT_THEME_KEY, &THEME_PRESETS[0].1),
        };
        Theme {
            key: key.to_string(),
            name: def.name.to_string(),
            primary: color_from_hex(def.primary).unwrap_or(Color::Blue),
            accent: color_from_hex(def.accent).unwrap_or(Color::Cyan),
            background: color_from_hex(def.background).unwrap_or(Color::Black),
            surface: color_from_hex(def.surface).unwrap_or(Color::DarkGray),
            text: color_from_hex(def.text).unwrap_or(Color::White),
        }
    }

    /// Reads the `skin` key from the theme record. A missing or unreadable
    /// record yields the default theme, which is written back.
    pub fn load(path: &Path) -> Self {
        match read_skin(path) {
            Ok(Some(skin)) if definition(&skin).is_some() => return Theme::from_key(&skin),
            Ok(_) => {}
            Err(err) => log::warn!("theme record unreadable, using default: {err:#}"),
        }
        let theme = Theme::from_key(DEFAULT_THEME_KEY);
        if let Err(err) = theme.save(path) {
            log::warn!("failed to write theme record: {err:#}");
        }
        theme
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let def = definition(&self.key).unwrap_or(&THEME_PRESETS[0].1);
        let file = ThemeFile {
            skin: Some(self.key.clone()),
            description: Some(format!("Menu Maker theme: {}", def.name)),
            colors: Some(ThemeColors {
                primary: def.primary.to_string(),
                accent: def.accent.to_string(),
                background: def.background.to_string(),
                surface: def.surface.to_string(),
                text: def.text.to_string(),
            }),
            metadata: Some(ThemeMetadata {
                created_by: "Menu Maker".into(),
                version: "1.0".into(),
                compatible_with: "ratatui".into(),
            }),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&file)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

fn read_skin(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: ThemeFile = serde_json::from_str(&data)?;
    Ok(file.skin)
}

#[derive(Serialize, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    skin: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    colors: Option<ThemeColors>,
    #[serde(default)]
    metadata: Option<ThemeMetadata>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct ThemeColors {
    primary: String,
    accent: String,
    background: String,
    surface: String,
    text: String,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct ThemeMetadata {
    created_by: String,
    version: String,
    compatible_with: String,
}
