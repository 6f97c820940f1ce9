//! Application discovery
//!
//! Builds the set of configured applications from the filesystem: every
//! subdirectory of the application directory with a `config.toml` descriptor
//! becomes an application (named after the directory). Installed packages
//! contribute their own asset trees to media resolution.

use crate::app::resolver::{self, HostMatch, ResolveError};
use crate::app::{AppConfig, Application};
use crate::config::PathsConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// An installed package contributing assets under its own name
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    /// Root of the package's per-category asset tree
    pub asset_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("application directory '{0}' does not exist")]
    MissingApplicationDir(PathBuf),
    #[error("no config.toml in application directory '{0}'")]
    MissingConfig(PathBuf),
    #[error("invalid application config '{path}': {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// All configured applications, packages and the global asset directory
pub struct AppRegistry {
    applications: Vec<Arc<Application>>,
    packages: Vec<Package>,
    asset_dir: Option<PathBuf>,
}

impl AppRegistry {
    /// Discover applications and packages from the configured directories
    pub fn discover(paths: &PathsConfig) -> Result<Self, RegistryError> {
        Self::discover_with(paths, |_| {})
    }

    /// Like [`AppRegistry::discover`], with a callback that can register
    /// handlers and hooks on each application before it is frozen
    pub fn discover_with(
        paths: &PathsConfig,
        mut configure: impl FnMut(&mut Application),
    ) -> Result<Self, RegistryError> {
        let application_dir = Path::new(&paths.application_dir);
        if !application_dir.is_dir() {
            return Err(RegistryError::MissingApplicationDir(
                application_dir.to_path_buf(),
            ));
        }

        let mut applications = Vec::new();
        for dir in subdirectories(application_dir)? {
            let name = directory_name(&dir);

            let config_path = dir.join("config.toml");
            if !config_path.is_file() {
                return Err(RegistryError::MissingConfig(dir));
            }
            let raw = fs::read_to_string(&config_path).map_err(|source| RegistryError::Io {
                path: config_path.clone(),
                source,
            })?;
            let config: AppConfig =
                toml::from_str(&raw).map_err(|source| RegistryError::InvalidConfig {
                    path: config_path,
                    source: Box::new(source),
                })?;

            let mut application = Application::new(name, dir, config);
            configure(&mut application);
            applications.push(Arc::new(application));
        }

        let mut packages = Vec::new();
        if let Some(package_dir) = &paths.package_dir {
            let package_dir = Path::new(package_dir);
            if package_dir.is_dir() {
                for dir in subdirectories(package_dir)? {
                    packages.push(Package {
                        name: directory_name(&dir),
                        asset_path: dir.join("media"),
                    });
                }
            }
        }

        Ok(Self {
            applications,
            packages,
            asset_dir: paths.asset_dir.as_ref().map(PathBuf::from),
        })
    }

    /// Resolve the application serving a hostname/path pair
    pub fn detect(&self, hostname: &str, request_uri: &str) -> Result<HostMatch, ResolveError> {
        resolver::detect(hostname, request_uri, &self.applications)
    }

    #[must_use]
    pub fn applications(&self) -> &[Arc<Application>] {
        &self.applications
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Application>> {
        self.applications.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    #[must_use]
    pub fn asset_dir(&self) -> Option<&Path> {
        self.asset_dir.as_deref()
    }
}

/// Non-hidden subdirectories, sorted by name so discovery order (and with it
/// resolution tie-breaking) is stable across platforms
fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let entries = fs::read_dir(dir).map_err(|source| RegistryError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && !directory_name(path).starts_with('.'))
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn directory_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_app(root: &Path, name: &str, config: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), config).unwrap();
    }

    fn paths(root: &Path) -> PathsConfig {
        PathsConfig {
            application_dir: root.to_string_lossy().into_owned(),
            asset_dir: None,
            package_dir: None,
        }
    }

    #[test]
    fn discovers_applications_by_directory() {
        let root = TempDir::new().unwrap();
        write_app(root.path(), "site", "hostnames = [\"example.com\"]\n");
        write_app(
            root.path(),
            "shop",
            "hostnames = [\"example.com\"]\nbase_uri = \"/shop\"\n",
        );

        let registry = AppRegistry::discover(&paths(root.path())).unwrap();
        assert_eq!(registry.applications().len(), 2);
        assert!(registry.get_by_name("site").is_some());
        assert_eq!(
            registry.get_by_name("shop").unwrap().config.base_uri(),
            "/shop"
        );
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let root = TempDir::new().unwrap();
        write_app(root.path(), "site", "hostnames = [\"example.com\"]\n");
        fs::create_dir_all(root.path().join(".git")).unwrap();

        let registry = AppRegistry::discover(&paths(root.path())).unwrap();
        assert_eq!(registry.applications().len(), 1);
    }

    #[test]
    fn missing_descriptor_is_a_startup_error() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("broken")).unwrap();

        let err = AppRegistry::discover(&paths(root.path())).unwrap_err();
        assert!(matches!(err, RegistryError::MissingConfig(_)));
    }

    #[test]
    fn invalid_descriptor_names_the_file() {
        let root = TempDir::new().unwrap();
        write_app(root.path(), "broken", "hostnames = 12\n");

        let err = AppRegistry::discover(&paths(root.path())).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidConfig { .. }));
    }

    #[test]
    fn detect_goes_through_the_discovered_set() {
        let root = TempDir::new().unwrap();
        write_app(root.path(), "site", "hostnames = [\"example.com\"]\n");

        let registry = AppRegistry::discover(&paths(root.path())).unwrap();
        let matched = registry.detect("example.com", "/").unwrap();
        assert_eq!(matched.application.name, "site");
    }

    #[test]
    fn packages_are_discovered() {
        let root = TempDir::new().unwrap();
        write_app(root.path(), "site", "hostnames = [\"example.com\"]\n");
        let package_root = TempDir::new().unwrap();
        fs::create_dir_all(package_root.path().join("gallery/media/css")).unwrap();

        let mut paths = paths(root.path());
        paths.package_dir = Some(package_root.path().to_string_lossy().into_owned());

        let registry = AppRegistry::discover(&paths).unwrap();
        assert_eq!(registry.packages().len(), 1);
        assert_eq!(registry.packages()[0].name, "gallery");
    }
}
