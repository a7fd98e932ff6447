//! Resolution of stylesheet and image references found in rendered HTML.
//!
//! References are resolved against the local asset directories first and fall back to a URL
//! built from the public base URL. Resolution never fails: a reference that cannot be found
//! on disk simply becomes a URL.

use std::fs;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Where static and media assets live on disk, and the URL prefixes that map onto them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    pub static_url: String,
    pub static_root: PathBuf,
    pub media_url: String,
    pub media_root: PathBuf,
    pub base_directory: PathBuf,
    /// TrueType font used for all document text. Without one the built-in Helvetica faces
    /// are used, which only cover Western European characters.
    pub font_file: Option<PathBuf>,
}

impl AssetPaths {
    /// Default layout: `/static/` → `<base>/static`, `/media/` → `<base>/media`.
    pub fn under_base(base_directory: PathBuf) -> Self {
        Self {
            static_url: "/static/".into(),
            static_root: base_directory.join("static"),
            media_url: "/media/".into(),
            media_root: base_directory.join("media"),
            base_directory,
            font_file: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Stylesheet,
    Image,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceLocation {
    /// Absolute path of an existing local file.
    Path(PathBuf),
    Url(Url),
}

/// A reference met during conversion and what it resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedResource {
    pub uri: String,
    pub kind: ResourceKind,
    pub location: ResourceLocation,
}

/// Maps URIs from the document layout to local files or absolute URLs.
#[derive(Clone, Debug)]
pub struct ResourceResolver {
    assets: AssetPaths,
    base_url: Url,
}

impl ResourceResolver {
    pub fn new(assets: AssetPaths, mut base_url: Url) -> Self {
        // Url::join replaces the last segment unless the base ends in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { assets, base_url }
    }

    pub fn static_url(&self) -> &str {
        &self.assets.static_url
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn font_file(&self) -> Option<&Path> {
        self.assets.font_file.as_deref()
    }

    /// Resolves `uri`.
    ///
    /// Order of attempts:
    /// 1. absolute `http`/`https` URIs are returned unchanged;
    /// 2. URIs under the static prefix map to `static_root`, under the media prefix to
    ///    `media_root`, anything else to `base_directory`;
    /// 3. if that file does not exist, the URI is joined onto the base URL.
    pub fn resolve(&self, uri: &str) -> ResourceLocation {
        let uri = uri.trim();

        if let Ok(absolute) = Url::parse(uri) {
            if matches!(absolute.scheme(), "http" | "https") {
                return ResourceLocation::Url(absolute);
            }
        }

        let local = if let Some(rest) = strip_prefix(uri, &self.assets.static_url) {
            existing_file(&self.assets.static_root, rest)
        } else if let Some(rest) = strip_prefix(uri, &self.assets.media_url) {
            existing_file(&self.assets.media_root, rest)
        } else {
            existing_file(&self.assets.base_directory, uri)
        };

        match local {
            Some(path) => {
                tracing::debug!(uri, path = %path.display(), "resolved resource to file");
                ResourceLocation::Path(path)
            }
            None => {
                let url = self.join(uri);
                tracing::debug!(uri, url = %url, "resolved resource to url");
                ResourceLocation::Url(url)
            }
        }
    }

    fn join(&self, uri: &str) -> Url {
        match self.base_url.join(uri.trim_start_matches('/')) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(uri, "could not join resource onto base url: {err}");
                self.base_url.clone()
            }
        }
    }
}

fn strip_prefix<'a>(uri: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    uri.strip_prefix(prefix)
}

/// Returns the absolute path of `root/<relative>` if it exists.
///
/// Query strings and fragments are ignored. Parent-directory segments never resolve.
fn existing_file(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = relative
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let relative = Path::new(relative);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    // canonicalize doubles as the existence check.
    fs::canonicalize(root.join(relative)).ok()
}
