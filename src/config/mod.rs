mod company;
mod settings;

pub use company::Company;
pub use settings::{
    Config, UploadSettings, VisionSettings, DEFAULT_ENDPOINT, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_MODEL,
};

use crate::error::{InvoiceError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{value, DocumentMut};
use tracing::debug;

pub const CONFIG_FILE: &str = "config.toml";

/// Get the config directory path (XDG-style, falling back to ~/.invoice-scan/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "invoice-scan") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        InvoiceError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".invoice-scan"))
}

/// Load config.toml. A missing file means defaults and no API key.
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| InvoiceError::ConfigParse { path, source: e })
}

/// Store the API key in config.toml, keeping the rest of the file as written
pub fn set_api_key(config_dir: &Path, api_key: &str) -> Result<()> {
    edit_config(config_dir, |doc| {
        doc["vision"]["api_key"] = value(api_key);
    })
}

/// Remove the API key from config.toml
pub fn clear_api_key(config_dir: &Path) -> Result<()> {
    edit_config(config_dir, |doc| {
        if let Some(vision) = doc.get_mut("vision").and_then(|v| v.as_table_like_mut()) {
            vision.remove("api_key");
        }
    })
}

fn edit_config(config_dir: &Path, apply: impl FnOnce(&mut DocumentMut)) -> Result<()> {
    if !config_dir.exists() {
        return Err(InvoiceError::ConfigNotFound(config_dir.to_path_buf()));
    }

    let path = config_dir.join(CONFIG_FILE);
    let content = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        String::new()
    };
    let mut doc = content
        .parse::<DocumentMut>()
        .map_err(|e| InvoiceError::ConfigEdit {
            path: path.clone(),
            source: e,
        })?;

    apply(&mut doc);

    fs::write(&path, doc.to_string())?;
    Ok(())
}

/// Mask all but the last four characters of a key for display
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[vision]
endpoint = "https://api.openai.com/v1/chat/completions"
model = "gpt-4o"
# timeout_secs = 60       # optional, transport default otherwise
# The API key is stored here by `invoice-scan key set <KEY>`.
# Without a key, extraction returns sample data.

[company]
# Printed in the "From" block of exported PDFs
name = "Your Company Name"
lines = ["123 Business Street", "San Francisco, CA 94102"]
email = "billing@yourcompany.com"

[upload]
max_bytes = 10485760      # 10 MB
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.vision.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.vision.api_key(), None);
        assert_eq!(config.upload.max_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn template_parses() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.vision.model, DEFAULT_MODEL);
        assert_eq!(config.company.name, "Your Company Name");
        assert_eq!(config.company.lines.len(), 2);
    }

    #[test]
    fn set_and_clear_key_preserves_comments() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), CONFIG_TEMPLATE).unwrap();

        set_api_key(dir.path(), "sk-test-1234").unwrap();
        let content = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(content.contains("# Printed in the \"From\" block"));
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.vision.api_key(), Some("sk-test-1234"));

        clear_api_key(dir.path()).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.vision.api_key(), None);
        assert_eq!(config.vision.model, DEFAULT_MODEL);
    }

    #[test]
    fn set_key_requires_config_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            set_api_key(&missing, "k"),
            Err(InvoiceError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let settings = VisionSettings {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.api_key(), None);
    }

    #[test]
    fn masks_keys() {
        assert_eq!(mask_key("sk-abcdef1234"), "*********1234");
        assert_eq!(mask_key("abc"), "***");
    }
}
