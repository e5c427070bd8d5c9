//! Reads and writes the TOML settings file.
//!
//! Whole-file saves regenerate the document with a comment above each table.
//! Section updates go through `toml_edit` so the rest of the file, including
//! hand edits and comments, survives. Every write lands in a sibling `.tmp`
//! file first and is renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot access '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid settings in '{}': {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Malformed TOML document: {0}")]
    Document(#[from] toml_edit::TomlError),
}

impl ConfigError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// In-memory [`Settings`] bound to a file on disk.
///
/// Edits through [`settings_mut`](Self::settings_mut) stay in memory until
/// [`save`](Self::save) or [`update_section`](Self::update_section).
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Manager holding defaults; nothing is read until `load*`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read the file, failing with [`ConfigError::NotFound`] if it is absent.
    pub fn load(&mut self) -> ConfigResult<()> {
        let content = self.read_existing()?;
        self.settings = self.deserialize(&content)?;
        Ok(())
    }

    /// Read the file, writing a default one first if there is none.
    ///
    /// A file with unknown tables or missing sections is rewritten in full so
    /// every option shows up with its default.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            tracing::info!("[Config] Creating {}", self.config_path.display());
            self.settings = Settings::default();
            return self.save();
        }

        let content = self.read_existing()?;
        self.settings = self.deserialize(&content)?;
        if needs_rewrite(&content.parse::<DocumentMut>()?) {
            self.save()?;
        }
        Ok(())
    }

    /// Create the output, temp, logs and fonts folders.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        let paths = &self.settings.paths;
        for dir in [
            &paths.output_folder,
            &paths.temp_root,
            &paths.logs_folder,
            &paths.fonts_folder,
        ] {
            fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
        }
        Ok(())
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    pub fn output_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_folder)
    }

    pub fn fonts_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.fonts_folder)
    }

    /// Write every section, replacing the file.
    pub fn save(&self) -> ConfigResult<()> {
        let mut output = String::from(
            "# subburn configuration\n\
             # Regenerated when sections are missing; single-section updates keep your edits.\n",
        );
        for section in ConfigSection::ALL {
            output.push_str(&format!(
                "\n{}\n[{}]\n{}",
                section.comment(),
                section.table_name(),
                self.section_body(section)?
            ));
        }

        self.replace_file(&output)?;
        tracing::debug!("[Config] Saved {}", self.config_path.display());
        Ok(())
    }

    /// Rewrite one table of the on-disk document from memory.
    ///
    /// The file is re-read first, so other tables keep whatever is on disk
    /// now rather than what was loaded earlier.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match fs::read_to_string(&self.config_path) {
            Ok(content) => content.parse::<DocumentMut>()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentMut::new(),
            Err(e) => return Err(ConfigError::io(&self.config_path, e)),
        };

        let fresh: DocumentMut = self.section_body(section)?.parse()?;
        doc[section.table_name()] = Item::Table(fresh.as_table().clone());

        self.replace_file(&doc.to_string())?;
        tracing::debug!(
            "[Config] Updated [{}] in {}",
            section.table_name(),
            self.config_path.display()
        );
        Ok(())
    }

    fn read_existing(&self) -> ConfigResult<String> {
        fs::read_to_string(&self.config_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(self.config_path.clone()),
            _ => ConfigError::io(&self.config_path, e),
        })
    }

    fn deserialize(&self, content: &str) -> ConfigResult<Settings> {
        toml::from_str(content).map_err(|source| ConfigError::Invalid {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Key/value lines of one section, without its `[table]` header.
    fn section_body(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        Ok(match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
            ConfigSection::Export => toml::to_string_pretty(&s.export)?,
            ConfigSection::Style => toml::to_string_pretty(&s.style)?,
            ConfigSection::Phrases => toml::to_string_pretty(&s.phrases)?,
        })
    }

    fn replace_file(&self, content: &str) -> ConfigResult<()> {
        let tmp = self.config_path.with_extension("toml.tmp");
        write_synced(&tmp, content)
            .and_then(|_| fs::rename(&tmp, &self.config_path))
            .map_err(|e| ConfigError::io(&self.config_path, e))
    }
}

/// Unknown tables are dropped and absent ones filled in by a full save.
fn needs_rewrite(doc: &DocumentMut) -> bool {
    let unknown: Vec<&str> = doc
        .iter()
        .map(|(key, _)| key)
        .filter(|key| !ConfigSection::ALL.iter().any(|s| s.table_name() == *key))
        .collect();
    if !unknown.is_empty() {
        tracing::warn!("[Config] Dropping unknown sections: {}", unknown.join(", "));
    }

    !unknown.is_empty()
        || ConfigSection::ALL
            .iter()
            .any(|section| !doc.contains_key(section.table_name()))
}

fn write_synced(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
