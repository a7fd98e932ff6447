//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Services never read process-wide environment variables during
//! request handling, which keeps behaviour consistent in multi-threaded runtimes and test
//! harnesses.

use crate::constants::{
    DEFAULT_MEDIA_URL, DEFAULT_STATIC_URL, DISCHARGES_DIR_NAME, PATIENTS_DIR_NAME,
};
use crate::{RecordError, RecordResult};
use documents::{AssetPaths, ResourceResolver};
use std::path::{Path, PathBuf};
use url::Url;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    assets: AssetPaths,
    public_url: Url,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidInput` if `public_url` is not an absolute `http`/`https`
    /// URL, or if an asset prefix does not start and end with `/`.
    pub fn new(data_dir: PathBuf, assets: AssetPaths, public_url: &str) -> RecordResult<Self> {
        let public_url = Url::parse(public_url.trim()).map_err(|err| {
            RecordError::InvalidInput(format!("public URL '{public_url}' is invalid: {err}"))
        })?;
        if !matches!(public_url.scheme(), "http" | "https") {
            return Err(RecordError::InvalidInput(
                "public URL must use http or https".into(),
            ));
        }

        for (name, prefix) in [("static", &assets.static_url), ("media", &assets.media_url)] {
            if !prefix.starts_with('/') || !prefix.ends_with('/') {
                return Err(RecordError::InvalidInput(format!(
                    "{name} URL prefix '{prefix}' must start and end with '/'"
                )));
            }
        }

        Ok(Self {
            data_dir,
            assets,
            public_url,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn discharges_dir(&self) -> PathBuf {
        self.data_dir.join(DISCHARGES_DIR_NAME)
    }

    pub fn assets(&self) -> &AssetPaths {
        &self.assets
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }

    /// Resolver for document resources.
    ///
    /// `base_url` is the URL the current request arrived on, if known; otherwise the
    /// configured public URL is used for fallback links.
    pub fn resolver(&self, base_url: Option<Url>) -> ResourceResolver {
        let base_url = base_url.unwrap_or_else(|| self.public_url.clone());
        ResourceResolver::new(self.assets.clone(), base_url)
    }
}

/// Build asset paths from optional string values, applying defaults for missing ones.
///
/// Blank values count as missing. Roots default to `static/` and `media/` under the base
/// directory.
pub fn asset_paths_from_env_values(
    base_dir: Option<String>,
    static_url: Option<String>,
    static_root: Option<String>,
    media_url: Option<String>,
    media_root: Option<String>,
) -> AssetPaths {
    fn present(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    let base_directory = PathBuf::from(present(base_dir).unwrap_or_else(|| ".".into()));
    let defaults = AssetPaths::under_base(base_directory);

    AssetPaths {
        static_url: present(static_url).unwrap_or_else(|| DEFAULT_STATIC_URL.into()),
        static_root: present(static_root)
            .map(PathBuf::from)
            .unwrap_or(defaults.static_root),
        media_url: present(media_url).unwrap_or_else(|| DEFAULT_MEDIA_URL.into()),
        media_root: present(media_root)
            .map(PathBuf::from)
            .unwrap_or(defaults.media_root),
        base_directory: defaults.base_directory,
        font_file: None,
    }
}

/// Path of the TrueType font embedded into documents, if one is configured.
///
/// Blank values count as missing.
pub fn font_file_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PUBLIC_URL;

    #[test]
    fn test_asset_defaults_live_under_base_dir() {
        let assets = asset_paths_from_env_values(Some("/srv/frontdesk".into()), None, None, Some("  ".into()), None);

        assert_eq!(assets.static_url, "/static/");
        assert_eq!(assets.static_root, PathBuf::from("/srv/frontdesk/static"));
        assert_eq!(assets.media_url, "/media/");
        assert_eq!(assets.media_root, PathBuf::from("/srv/frontdesk/media"));
        assert_eq!(assets.font_file, None);
    }

    #[test]
    fn test_font_file_ignores_blank_values() {
        assert_eq!(font_file_from_env_value(None), None);
        assert_eq!(font_file_from_env_value(Some("   ".into())), None);
        assert_eq!(
            font_file_from_env_value(Some(" /usr/share/fonts/NotoSans.ttf ".into())),
            Some(PathBuf::from("/usr/share/fonts/NotoSans.ttf"))
        );
    }

    #[test]
    fn test_explicit_roots_override_defaults() {
        let assets = asset_paths_from_env_values(
            None,
            Some("/assets/".into()),
            Some("/var/www/assets".into()),
            None,
            None,
        );

        assert_eq!(assets.static_url, "/assets/");
        assert_eq!(assets.static_root, PathBuf::from("/var/www/assets"));
        assert_eq!(assets.base_directory, PathBuf::from("."));
    }

    #[test]
    fn test_config_rejects_bad_public_url_and_prefix() {
        let assets = AssetPaths::under_base(PathBuf::from("."));
        assert!(CoreConfig::new(PathBuf::from("data"), assets.clone(), "not a url").is_err());
        assert!(CoreConfig::new(PathBuf::from("data"), assets.clone(), "ftp://host/").is_err());

        let mut bad_prefix = assets.clone();
        bad_prefix.static_url = "static".into();
        assert!(CoreConfig::new(PathBuf::from("data"), bad_prefix, DEFAULT_PUBLIC_URL).is_err());

        let cfg = CoreConfig::new(PathBuf::from("data"), assets, DEFAULT_PUBLIC_URL).unwrap();
        assert_eq!(cfg.patients_dir(), PathBuf::from("data/patients"));
        assert_eq!(cfg.discharges_dir(), PathBuf::from("data/discharges"));
    }
}
