//! Filesystem-backed hosting environment

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use contracts::{HostingConfig, HostingEnvironment, ResourceStream};

use crate::report_html::STYLESHEET;

/// Served when the resources directory carries no stylesheet of its own
const DEFAULT_STYLESHEET: &str = "\
body { font-family: sans-serif; margin: 1em 2em; }
table { border-collapse: collapse; margin-bottom: 1em; }
th, td { border: 1px solid #ccc; padding: 2px 6px; text-align: left; }
.message { background: #ffd; border: 1px solid #cc9; padding: 4px; }
.selected { font-weight: bold; }
.graphs img { margin: 2px; border: 1px solid #ddd; }
";

/// Resources and deployment metadata read from two directories
#[derive(Debug, Clone)]
pub struct DirectoryHosting {
    resources_dir: PathBuf,
    deployment_dir: PathBuf,
    /// Prefix the dispatcher puts in front of resource names
    resource_root: String,
}

impl DirectoryHosting {
    pub fn new(
        resources_dir: impl Into<PathBuf>,
        deployment_dir: impl Into<PathBuf>,
        resource_root: impl Into<String>,
    ) -> Self {
        Self {
            resources_dir: resources_dir.into(),
            deployment_dir: deployment_dir.into(),
            resource_root: resource_root.into(),
        }
    }

    pub fn from_config(config: &HostingConfig, resource_root: &str) -> Self {
        Self::new(
            config.resources_dir.clone(),
            config.deployment_dir.clone(),
            resource_root,
        )
    }
}

/// Join a slash-separated relative path, refusing anything that escapes `base`
fn safe_join(base: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative.trim_start_matches('/'));
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| base.join(relative))
}

fn open_file(path: Option<PathBuf>) -> io::Result<Option<ResourceStream>> {
    let Some(path) = path else {
        return Ok(None);
    };
    match File::open(&path) {
        Ok(file) if path.is_file() => Ok(Some(Box::new(file))),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl HostingEnvironment for DirectoryHosting {
    fn bundled_resource(&self, path: &str) -> io::Result<Option<ResourceStream>> {
        let Some(name) = path.strip_prefix(&self.resource_root) else {
            debug!(path, root = %self.resource_root, "Resource outside the resource root");
            return Ok(None);
        };
        match open_file(safe_join(&self.resources_dir, name))? {
            Some(stream) => Ok(Some(stream)),
            None if name == STYLESHEET => Ok(Some(Box::new(Cursor::new(DEFAULT_STYLESHEET)))),
            None => Ok(None),
        }
    }

    fn deployment_resource(&self, path: &str) -> io::Result<Option<ResourceStream>> {
        open_file(safe_join(&self.deployment_dir, path))
    }

    fn deployment_paths(&self, dir: &str) -> Option<Vec<String>> {
        let on_disk = safe_join(&self.deployment_dir, dir)?;
        let entries = fs::read_dir(on_disk).ok()?;
        let prefix = if dir.ends_with('/') {
            dir.to_string()
        } else {
            format!("{dir}/")
        };

        let mut paths: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let is_dir = entry.file_type().ok()?.is_dir();
                Some(if is_dir {
                    format!("{prefix}{name}/")
                } else {
                    format!("{prefix}{name}")
                })
            })
            .collect();
        paths.sort();
        Some(paths)
    }

    fn mime_type(&self, path: &str) -> Option<String> {
        mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    const ROOT: &str = "/monitoring/resource/";

    fn read(stream: Option<ResourceStream>) -> Option<String> {
        let mut text = String::new();
        stream?.read_to_string(&mut text).unwrap();
        Some(text)
    }

    fn setup() -> (TempDir, DirectoryHosting) {
        let dir = TempDir::new().unwrap();
        let resources = dir.path().join("resources");
        let webapp = dir.path().join("webapp");
        fs::create_dir_all(resources.join("img")).unwrap();
        fs::create_dir_all(webapp.join("WEB-INF")).unwrap();
        fs::create_dir_all(webapp.join("META-INF/maven/com.shop/shop-web")).unwrap();
        fs::write(resources.join("img/logo.png"), b"png").unwrap();
        fs::write(webapp.join("WEB-INF/web.xml"), b"<web-app/>").unwrap();
        fs::write(
            webapp.join("META-INF/maven/com.shop/shop-web/pom.xml"),
            b"<project/>",
        )
        .unwrap();
        fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        let hosting = DirectoryHosting::new(resources, webapp, ROOT);
        (dir, hosting)
    }

    #[test]
    fn test_bundled_resource() {
        let (_dir, hosting) = setup();
        let logo = hosting.bundled_resource("/monitoring/resource/img/logo.png").unwrap();
        assert_eq!(read(logo).as_deref(), Some("png"));
        assert!(hosting
            .bundled_resource("/monitoring/resource/missing.js")
            .unwrap()
            .is_none());
        assert!(hosting.bundled_resource("/elsewhere/logo.png").unwrap().is_none());
    }

    #[test]
    fn test_default_stylesheet() {
        let (_dir, hosting) = setup();
        let css = read(hosting.bundled_resource("/monitoring/resource/monitoring.css").unwrap());
        assert!(css.unwrap().contains("font-family"));
    }

    #[test]
    fn test_parent_components_are_refused() {
        let (_dir, hosting) = setup();
        assert!(hosting
            .bundled_resource("/monitoring/resource/../secret.txt")
            .unwrap()
            .is_none());
        assert!(hosting.deployment_resource("/../secret.txt").unwrap().is_none());
        assert!(hosting.deployment_paths("/../").is_none());
    }

    #[test]
    fn test_deployment_tree() {
        let (_dir, hosting) = setup();
        let web_xml = hosting.deployment_resource("/WEB-INF/web.xml").unwrap();
        assert_eq!(read(web_xml).as_deref(), Some("<web-app/>"));

        assert_eq!(
            hosting.deployment_paths("/META-INF/maven/"),
            Some(vec!["/META-INF/maven/com.shop/".to_string()])
        );
        assert_eq!(
            hosting.deployment_paths("/META-INF/maven/com.shop/"),
            Some(vec!["/META-INF/maven/com.shop/shop-web/".to_string()])
        );
        assert!(hosting.deployment_paths("/nope/").is_none());
        assert!(hosting.deployment_resource("/WEB-INF").unwrap().is_none());
    }

    #[test]
    fn test_mime_types() {
        let (_dir, hosting) = setup();
        assert_eq!(hosting.mime_type("/a/b.css").as_deref(), Some("text/css"));
        assert!(hosting.mime_type("/WEB-INF/web.xml").unwrap().ends_with("/xml"));
        assert_eq!(hosting.mime_type("/a/b.png").as_deref(), Some("image/png"));
        assert!(hosting.mime_type("/a/noext").is_none());
    }
}
