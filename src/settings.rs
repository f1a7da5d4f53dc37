//! Scene configuration read once at startup.
//!
//! The document names a root folder and file names relative to it. Shaders
//! live in `<root>/shaders/`, models and textures in `<root>/res/`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, resources::load_string};

pub const SHADER_DIR: &str = "shaders";
pub const RESOURCE_DIR: &str = "res";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectSettings {
    pub model: String,
    pub texture: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SunSettings {
    pub model: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    pub root_folder: PathBuf,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub objects: Vec<ObjectSettings>,
    pub sun: SunSettings,
}

impl Settings {
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn shader_path(&self, file_name: &str) -> PathBuf {
        self.root_folder.join(SHADER_DIR).join(file_name)
    }

    pub fn resource_path(&self, file_name: &str) -> PathBuf {
        self.root_folder.join(RESOURCE_DIR).join(file_name)
    }
}

/// Read and validate the settings document at `path`.
pub async fn load_settings(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let text = load_string(path).await.map_err(|source| {
        log::error!("Unable to find settings file {:?}", path);
        ConfigError::Missing {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let settings = Settings::from_json(path, &text).inspect_err(|e| log::error!("{}", e))?;
    log::info!(
        "successfully loaded settings with {} objects from {:?}",
        settings.objects.len(),
        path
    );
    Ok(settings)
}
