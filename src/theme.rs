use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("dracula", include_str!("../themes/dracula.toml")),
    ("github_dark", include_str!("../themes/github_dark.toml")),
    ("github_light", include_str!("../themes/github_light.toml")),
    ("solarized_light", include_str!("../themes/solarized_light.toml")),
];

const DEFAULT_THEME: &str = "github_light";

/// Colors a diagram is painted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub background_color: String,
    pub text_color: String,
    pub box_fill_color: String,
    pub header_color: String,
    pub key_color: String,
    pub connector_color: String,
    pub muted_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_builtin(DEFAULT_THEME).unwrap_or_else(|_| Self::github_light())
    }
}

#[derive(Debug, Deserialize)]
struct AlacrittyColors {
    primary: AlacrittyPrimary,
    normal: AlacrittyNormal,
}

#[derive(Debug, Deserialize)]
struct AlacrittyPrimary {
    background: String,
    foreground: String,
}

#[derive(Debug, Deserialize)]
struct AlacrittyNormal {
    black: String,
    yellow: String,
    blue: String,
    cyan: String,
    white: String,
}

#[derive(Debug, Deserialize)]
struct AlacrittyTheme {
    colors: AlacrittyColors,
}

impl Theme {
    pub fn github_light() -> Self {
        Theme {
            background_color: "#ffffff".to_string(),
            text_color: "#24292f".to_string(),
            box_fill_color: "#f6f8fa".to_string(),
            header_color: "#0969da".to_string(),
            key_color: "#4d2d00".to_string(),
            connector_color: "#1b7c83".to_string(),
            muted_color: "#6e7781".to_string(),
        }
    }

    pub fn from_builtin(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        let content = BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| {
                Error::Theme(format!(
                    "unknown built-in theme '{}'. Available: {}",
                    name,
                    Self::list_builtins().join(", ")
                ))
            })?;
        Self::from_alacritty_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_THEMES.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_alacritty_yaml(content: &str) -> Result<Self> {
        let alacritty: AlacrittyTheme = serde_yaml::from_str(content)
            .map_err(|e| Error::Theme(format!("failed to parse Alacritty YAML: {}", e)))?;
        Ok(Self::from_alacritty_theme(alacritty))
    }

    pub fn from_alacritty_toml(content: &str) -> Result<Self> {
        let alacritty: AlacrittyTheme = toml::from_str(content)
            .map_err(|e| Error::Theme(format!("failed to parse Alacritty TOML: {}", e)))?;
        Ok(Self::from_alacritty_theme(alacritty))
    }

    /// Resolve a `--theme` argument: an existing file (TOML, then YAML) or a built-in name.
    pub fn load(name_or_path: &str) -> Result<Self> {
        let path = std::path::Path::new(name_or_path);
        if !path.is_file() {
            return Self::from_builtin(name_or_path);
        }

        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_alacritty_toml(&content)
            .or_else(|_| Self::from_alacritty_yaml(&content))
            .map_err(|_| {
                Error::Theme(format!(
                    "failed to parse {} as TOML or YAML",
                    path.display()
                ))
            })
    }

    fn from_alacritty_theme(alacritty: AlacrittyTheme) -> Self {
        let colors = alacritty.colors;
        Theme {
            background_color: colors.primary.background,
            text_color: colors.primary.foreground,
            box_fill_color: colors.normal.black,
            header_color: colors.normal.blue,
            key_color: colors.normal.yellow,
            connector_color: colors.normal.cyan,
            muted_color: colors.normal.white,
        }
    }
}
