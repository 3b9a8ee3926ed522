use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::query::PAGE_SIZES;
use crate::store;

const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "contactdesk.log";
const APP_NAME: &str = "contactdesk";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub api_url: String,
    /// Token and user from the file win over the stored session.
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub db_path: PathBuf,
    pub log_file: PathBuf,
    pub table: TableConfig,
    pub keys: Keys,
    pub ui: UiConfig,
}

#[derive(Debug, Clone)]
pub struct TableConfig {
    pub page_size: u32,
    pub overscan: usize,
    pub min_column_width: u16,
    pub cache_ttl: Duration,
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub header_fg: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
    pub error_fg: RgbColor,
    pub saving_fg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

/// Declares one key context: the public struct, its defaults, the
/// file-side struct that accepts a string or a list per action, and the
/// conversion between them.
macro_rules! key_context {
    ($name:ident, $file:ident, $context:literal {
        $($action:ident => [$($key:literal),* $(,)?]),+ $(,)?
    }) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            $(pub $action: Vec<String>,)+
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($action: vec![$($key.to_string()),*],)+
                }
            }
        }

        impl $name {
            const CONTEXT: &'static str = $context;
            const ACTIONS: &'static [&'static str] = &[$(stringify!($action)),+];

            fn bindings(&self) -> Vec<(&'static str, &[String])> {
                vec![$((stringify!($action), self.$action.as_slice())),+]
            }
        }

        #[derive(Debug, Deserialize)]
        #[serde(default)]
        struct $file {
            $($action: KeyBinding,)+
        }

        impl Default for $file {
            fn default() -> Self {
                let defaults = $name::default();
                Self {
                    $($action: KeyBinding::Multiple(defaults.$action),)+
                }
            }
        }

        impl From<$file> for $name {
            fn from(file: $file) -> Self {
                Self {
                    $($action: file.$action.into_vec(),)+
                }
            }
        }
    };
}

key_context!(GlobalKeys, GlobalKeysFile, "global" {
    quit => ["q"],
    help => ["F1", "?"],
    search => ["/"],
    refresh => ["F5"],
    preset_next => ["v"],
    preset_prev => ["V"],
    page_size => ["z"],
});

key_context!(TableKeys, TableKeysFile, "table" {
    next => ["j", "Down"],
    prev => ["k", "Up"],
    left => ["h", "Left"],
    right => ["l", "Right"],
    page_down => ["PageDown"],
    page_up => ["PageUp"],
    first => ["g", "Home"],
    last => ["G", "End"],
    edit => ["Enter", "e"],
    open => ["o"],
    select => ["Space"],
    select_all => ["a"],
    delete => ["d"],
    next_page => ["]"],
    prev_page => ["["],
    first_page => ["{"],
    last_page => ["}"],
    resize => ["w"],
    reorder => ["m"],
    hide => ["x"],
    columns => ["c"],
});

key_context!(EditorKeys, EditorKeysFile, "editor" {
    cancel => ["Escape"],
    confirm => ["Enter"],
    next => ["Tab"],
    prev => ["Backtab"],
    up => ["Up"],
    down => ["Down"],
});

key_context!(DetailKeys, DetailKeysFile, "detail" {
    close => ["Escape", "q"],
    next => ["j", "Down"],
    prev => ["k", "Up"],
    tab_next => ["l", "Right"],
    tab_prev => ["h", "Left"],
    focus => ["Tab"],
    open => ["Enter"],
    edit => ["e"],
    new_task => ["t"],
    new_note => ["n"],
    new_activity => ["a"],
    delete => ["d"],
    toggle => ["Space"],
    status_filter => ["s"],
    priority_filter => ["p"],
});

key_context!(FormKeys, FormKeysFile, "form" {
    cancel => ["Escape"],
    submit => ["Enter"],
    next => ["Tab", "Down"],
    prev => ["Backtab", "Up"],
    choice_next => ["Right"],
    choice_prev => ["Left"],
    move_mode => ["F2"],
});

key_context!(ModalKeys, ModalKeysFile, "modal" {
    cancel => ["Escape", "n"],
    confirm => ["Enter", "y"],
    next => ["j", "Down"],
    prev => ["k", "Up"],
    toggle => ["Space"],
});

/// All key bindings organized by context
#[derive(Debug, Clone, Default)]
pub struct Keys {
    pub global: GlobalKeys,
    pub table: TableKeys,
    /// Inline cell and field editing
    pub editor: EditorKeys,
    pub detail: DetailKeys,
    /// Task / note / activity popup
    pub form: FormKeys,
    /// Confirm, column picker and help dialogs
    pub modal: ModalKeys,
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

impl Default for KeyBinding {
    fn default() -> Self {
        KeyBinding::Multiple(vec![])
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    table: TableKeysFile,
    editor: EditorKeysFile,
    detail: DetailKeysFile,
    form: FormKeysFile,
    modal: ModalKeysFile,
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: file.global.into(),
            table: file.table.into(),
            editor: file.editor.into(),
            detail: file.detail.into(),
            form: file.form.into(),
            modal: file.modal.into(),
        }
    }
}

/// Normalize a key binding string to a canonical form for collision detection.
/// Single characters preserve case (since 'M' means Shift+m, different from 'm').
/// Multi-character key names are case-insensitive (Enter, ENTER, enter are the same).
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        match trimmed.to_ascii_lowercase().as_str() {
            "esc" => "escape".to_string(),
            "shift+tab" => "backtab".to_string(),
            "page_up" => "pageup".to_string(),
            "page_down" => "pagedown".to_string(),
            other => other.to_string(),
        }
    }
}

/// Check for collisions within a single context
fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

fn validate_key_bindings(keys: &Keys) -> Result<()> {
    check_context_collisions(&keys.global.bindings(), GlobalKeys::CONTEXT)?;
    check_context_collisions(&keys.table.bindings(), TableKeys::CONTEXT)?;
    check_context_collisions(&keys.editor.bindings(), EditorKeys::CONTEXT)?;
    check_context_collisions(&keys.detail.bindings(), DetailKeys::CONTEXT)?;
    check_context_collisions(&keys.form.bindings(), FormKeys::CONTEXT)?;
    check_context_collisions(&keys.modal.bindings(), ModalKeys::CONTEXT)?;
    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    api_url: Option<String>,
    token: Option<String>,
    user_id: Option<String>,
    db_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
    table: TableFile,
    keys: KeysFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TableFile {
    page_size: u32,
    overscan: usize,
    min_column_width: u16,
    cache_ttl_secs: u64,
}

impl Default for TableFile {
    fn default() -> Self {
        Self {
            page_size: 100,
            overscan: 5,
            min_column_width: 8,
            cache_ttl_secs: 30,
        }
    }
}

impl TableFile {
    fn into_config(self) -> Result<TableConfig> {
        if !PAGE_SIZES.contains(&self.page_size) {
            bail!(
                "table.page_size must be one of {:?}, got {}",
                PAGE_SIZES,
                self.page_size
            );
        }
        if self.min_column_width < 3 {
            bail!("table.min_column_width must be at least 3");
        }
        Ok(TableConfig {
            page_size: self.page_size,
            overscan: self.overscan,
            min_column_width: self.min_column_width,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    header_fg: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
    error_fg: RgbColor,
    saving_fg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(95, 175, 215),
            selection_bg: RgbColor::new(95, 175, 215),
            selection_fg: RgbColor::new(0, 0, 0),
            header_fg: RgbColor::new(95, 175, 215),
            status_fg: RgbColor::new(95, 175, 215),
            status_bg: RgbColor::new(0, 0, 0),
            error_fg: RgbColor::new(255, 95, 95),
            saving_fg: RgbColor::new(255, 215, 0),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                header_fg: file.colors.header_fg,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
                error_fg: file.colors.error_fg,
                saving_fg: file.colors.saving_fg,
            },
        }
    }
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load from `explicit` when given, otherwise from the per-user config dir.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => expand_tilde(path),
        None => config_path()?,
    };
    if !path.exists() {
        bail!(
            "configuration file not found at {}. Create it with at least `api_url = \"https://...\"`.",
            path.display()
        );
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, path)
}

/// Parse configuration text; `path` is only used for messages.
pub(crate) fn parse(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let api_url = cfg_file
        .api_url
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| anyhow!("`api_url` must be specified in configuration"))?;
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        bail!("`api_url` must start with http:// or https://, got {}", api_url);
    }

    let non_empty = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let db_path = match cfg_file.db_path {
        Some(path) => expand_tilde(&path),
        None => store::default_path()?,
    };
    let log_file = match cfg_file.log_file {
        Some(path) => expand_tilde(&path),
        None => store::data_dir()?.join(LOG_FILE_NAME),
    };

    let keys: Keys = cfg_file.keys.into();
    validate_key_bindings(&keys)?;

    let table = cfg_file
        .table
        .into_config()
        .context("failed to parse [table] configuration")?;

    Ok(Config {
        config_path: path,
        api_url,
        token: non_empty(cfg_file.token),
        user_id: non_empty(cfg_file.user_id),
        db_path,
        log_file,
        table,
        keys,
        ui: cfg_file.ui.into(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from([
        "api_url", "token", "user_id", "db_path", "log_file", "table", "keys", "ui",
    ]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }

    if let Some(v) = table.get("table") {
        warn_unknown_in(
            v,
            "table",
            &["page_size", "overscan", "min_column_width", "cache_ttl_secs"],
        );
    }
    if let Some(v) = table.get("keys") {
        warn_unknown_keys_section(v);
    }
    if let Some(v) = table.get("ui") {
        warn_unknown_in(v, "ui", &["colors"]);
        if let Some(colors) = v.get("colors") {
            warn_unknown_in(
                colors,
                "ui.colors",
                &[
                    "border",
                    "selection_bg",
                    "selection_fg",
                    "header_fg",
                    "status_fg",
                    "status_bg",
                    "error_fg",
                    "saving_fg",
                ],
            );
        }
    }
}

fn warn_unknown_keys_section(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let contexts: [(&str, &[&str]); 6] = [
        (GlobalKeys::CONTEXT, GlobalKeys::ACTIONS),
        (TableKeys::CONTEXT, TableKeys::ACTIONS),
        (EditorKeys::CONTEXT, EditorKeys::ACTIONS),
        (DetailKeys::CONTEXT, DetailKeys::ACTIONS),
        (FormKeys::CONTEXT, FormKeys::ACTIONS),
        (ModalKeys::CONTEXT, ModalKeys::ACTIONS),
    ];

    for key in table.keys() {
        if !contexts.iter().any(|(name, _)| name == key) {
            eprintln!("warning: unknown keys.* context `{}`", key);
        }
    }
    for (name, actions) in contexts {
        if let Some(v) = table.get(name) {
            warn_unknown_in(v, &format!("keys.{}", name), actions);
        }
    }
}

fn warn_unknown_in(value: &toml::Value, section: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known_set: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known_set.contains(key.as_str()) {
            eprintln!("warning: unknown {} entry `{}`", section, key);
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(raw: &str) -> Result<Config> {
        parse(raw, PathBuf::from("/tmp/contactdesk-test.toml"))
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_str("api_url = \"https://crm.example.com/\"\ndb_path = \"/tmp/x.db\"\nlog_file = \"/tmp/x.log\"").unwrap();
        assert_eq!(config.api_url, "https://crm.example.com");
        assert_eq!(config.table.page_size, 100);
        assert_eq!(config.table.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.table.min_column_width, 8);
        assert_eq!(config.keys.global.quit, vec!["q".to_string()]);
        assert_eq!(config.token, None);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_api_url_required_and_checked() {
        let err = parse_str("token = \"abc\"").unwrap_err();
        assert!(err.to_string().contains("api_url"));
        let err = parse_str("api_url = \"crm.example.com\"").unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_page_size_must_be_offered() {
        let err = parse_str("api_url = \"http://localhost:3000\"\n[table]\npage_size = 30")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("page_size"));
    }

    #[test]
    fn test_single_string_binding_and_colors() {
        let config = parse_str(
            "api_url = \"http://localhost:3000\"\n\
             [keys.table]\nopen = \"O\"\n\
             [ui.colors]\nborder = [1, 2, 3]\nerror_fg = { r = 9, g = 8, b = 7 }",
        )
        .unwrap();
        assert_eq!(config.keys.table.open, vec!["O".to_string()]);
        assert_eq!(config.ui.colors.border, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.error_fg, RgbColor::new(9, 8, 7));
    }

    #[test]
    fn test_collisions_are_rejected() {
        let err = parse_str("api_url = \"http://localhost:3000\"\n[keys.table]\ndelete = \"o\"")
            .unwrap_err();
        assert!(err.to_string().contains("collision"));

        let err = parse_str("api_url = \"http://localhost:3000\"\n[keys.editor]\ncancel = [\"esc\", \"Enter\"]")
            .unwrap_err();
        assert!(err.to_string().contains("keys.editor"));
    }
}
