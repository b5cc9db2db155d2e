#[cfg(any(feature = "json", feature = "yaml"))]
use std::fs::File;
#[cfg(feature = "toml")]
use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[allow(unused_imports)]
use crate::error::{HttpiResult, IntoResult, SettingError};

use super::helper::{http_serde_priv, is_default::IsDefault};

/// Defaults shared by every request of a dispatcher.
///
/// ```yaml
/// origin: http://localhost:3000
/// headers:
///   authorization: Bearer token
/// keep-trailing-slash: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Setting {
    /// Scheme, authority and path prefix that relative urls are resolved against.
    #[serde(default, skip_serializing_if = "IsDefault::is_default")]
    pub origin: Option<http_serde_priv::Uri>,
    #[serde(default, skip_serializing_if = "IsDefault::is_default")]
    pub headers: http_serde_priv::HeaderMap,
    /// Used when a request does not specify it. Resources made by `Httpi::resource` start from this value.
    #[serde(default, skip_serializing_if = "IsDefault::is_default")]
    pub keep_trailing_slash: Option<bool>,
}

impl Setting {
    pub fn read<A: AsRef<Path>>(path: A) -> HttpiResult<Self> {
        Format::from_path(path.as_ref())?.deserialize_setting(path.as_ref())
    }
    pub fn read_str(s: &str, format: Format) -> HttpiResult<Self> {
        format.deserialize_setting_str(s)
    }

    pub fn with_origin(self, origin: http::Uri) -> Self {
        Self { origin: Some(origin.into()), ..self }
    }
    pub fn origin(&self) -> Option<&http::Uri> {
        self.origin.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[cfg(feature = "json")]
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}
impl Format {
    pub fn from_path<A: AsRef<Path>>(path: A) -> HttpiResult<Self> {
        let basename = path.as_ref().extension().and_then(|ext| ext.to_str());
        match basename {
            #[cfg(feature = "json")]
            Some("json") => Ok(Format::Json),
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Ok(Format::Yaml),
            #[cfg(feature = "toml")]
            Some("toml") => Ok(Format::Toml),
            Some(ext) => Err(SettingError::UnknownFormatExtension(ext.to_string()))?,
            _ => Err(SettingError::CannotSpecifyFormat)?,
        }
    }

    #[allow(unused_variables)]
    pub fn deserialize_setting<A: AsRef<Path>>(&self, path: A) -> HttpiResult<Setting> {
        match self {
            #[cfg(feature = "json")]
            Format::Json => serde_json::from_reader(File::open(path).box_err()?).box_err(),
            #[cfg(feature = "yaml")]
            Format::Yaml => serde_yaml::from_reader(File::open(path).box_err()?).box_err(),
            #[cfg(feature = "toml")]
            Format::Toml => toml::from_str(&read_to_string(path).box_err()?).box_err(),
            #[cfg(not(any(feature = "json", feature = "yaml", feature = "toml")))]
            _ => Err(SettingError::UndefinedSerializeFormat)?,
        }
    }

    #[allow(unused_variables)]
    pub fn deserialize_setting_str(&self, content: &str) -> HttpiResult<Setting> {
        match self {
            #[cfg(feature = "json")]
            Format::Json => serde_json::from_str(content).box_err(),
            #[cfg(feature = "yaml")]
            Format::Yaml => serde_yaml::from_str(content).box_err(),
            #[cfg(feature = "toml")]
            Format::Toml => toml::from_str(content).box_err(),
            #[cfg(not(any(feature = "json", feature = "yaml", feature = "toml")))]
            _ => Err(SettingError::UndefinedSerializeFormat)?,
        }
    }
}
