//! Configuration lookups across arguments, environment and value trees.
//!
//! A key such as `server.port` is looked up, in order:
//!
//! 1. as the program argument `--server-port <value>`,
//! 2. as the environment variable `<PREFIX>_SERVER_PORT`,
//! 3. in the group documents found in the search directories,
//! 4. in the secrets directory.
//!
//! Group documents are YAML or JSON files named after the group, with
//! optional tagged variants (`server@prod.yaml`). Within a document, keys
//! may carry tags too (`port@prod: 443`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use valtree::{
    Attribute, Compound, FetchValue, FromText, TreePath, ValueKind, from_filesystem_path,
    from_json_text, from_yaml_text,
};

use crate::error::{ConfigError, Result, ValueOrigin};
use crate::sources::ConfigSources;

const EXTENSIONS: [&str; 2] = ["yaml", "json"];

pub struct AppConfig {
    sources: ConfigSources,
    documents: RefCell<HashMap<PathBuf, Compound>>,
    secrets: RefCell<Option<Compound>>,
}

impl AppConfig {
    pub fn new(sources: ConfigSources) -> Self {
        AppConfig {
            sources,
            documents: RefCell::new(HashMap::new()),
            secrets: RefCell::new(None),
        }
    }

    /// Configuration of the running process, see [`ConfigSources::discover`].
    pub fn discover(app_name: &str) -> Self {
        AppConfig::new(ConfigSources::discover(app_name))
    }

    pub fn sources(&self) -> &ConfigSources {
        &self.sources
    }

    /// Forget every opened document so the next lookup reads them again.
    pub fn reload(&self) {
        self.documents.borrow_mut().clear();
        self.secrets.borrow_mut().take();
        tracing::debug!(app = %self.sources.app_name, "configuration reloaded");
    }

    /// The tree attribute for `key`, preferring `tag` over the configured
    /// tags.
    pub fn find(&self, key: &str, tag: Option<&str>) -> Option<Attribute> {
        let found = self.find_in_trees(key, tag);
        if found.is_none() {
            tracing::warn!(key, "configuration value not found");
        }
        found
    }

    /// The value for `key` from the first source that has one which
    /// converts to `T`.
    pub fn fetch<T: FetchValue + FromText>(&self, key: &str, tag: Option<&str>) -> Option<T> {
        let arg = arg_name(key);
        for occurrence in arg_occurrences(&self.sources.args, &arg) {
            match occurrence {
                Some(text) => match T::from_text(text) {
                    Some(value) => return Some(value),
                    None => log_convert_error(key, ValueOrigin::Argument, text),
                },
                None => {
                    let error = ConfigError::MissingArgument { arg: arg.clone() };
                    tracing::error!(%error, "ignoring argument");
                }
            }
        }
        if let Some(text) = self.env_value(key) {
            match T::from_text(text) {
                Some(value) => return Some(value),
                None => log_convert_error(key, ValueOrigin::Environment, text),
            }
        }
        let attribute = self.find(key, tag)?;
        let value = attribute.get::<T>();
        if value.is_none() {
            let error = ConfigError::Fetch { key: key.to_string() };
            tracing::error!(%error, "ignoring configuration value");
        }
        value
    }

    /// Every value for `key`: each occurrence of the argument, the
    /// environment variable and all values of the tree attribute.
    pub fn fetch_all<T: FetchValue + FromText>(
        &self,
        key: &str,
        tag: Option<&str>,
    ) -> Result<Vec<T>> {
        let arg = arg_name(key);
        let mut values = Vec::new();
        for occurrence in arg_occurrences(&self.sources.args, &arg) {
            let text = occurrence.ok_or_else(|| ConfigError::MissingArgument { arg: arg.clone() })?;
            values.push(convert(key, ValueOrigin::Argument, text)?);
        }
        if let Some(text) = self.env_value(key) {
            values.push(convert(key, ValueOrigin::Environment, text)?);
        }
        if let Some(attribute) = self.find_in_trees(key, tag) {
            values.extend(tree_values(key, &attribute)?);
        }
        if values.is_empty() {
            tracing::warn!(key, "configuration value not found");
        }
        Ok(values)
    }

    /// Whether the boolean flag `key` is on. A bare `--flag` argument
    /// counts as set.
    pub fn is_set(&self, key: &str, tag: Option<&str>) -> bool {
        let arg = arg_name(key);
        for occurrence in arg_occurrences(&self.sources.args, &arg) {
            let Some(text) = occurrence else {
                return true;
            };
            match bool::from_text(text) {
                Some(value) => return value,
                None => log_convert_error(key, ValueOrigin::Argument, text),
            }
        }
        if let Some(text) = self.env_value(key) {
            match bool::from_text(text) {
                Some(value) => return value,
                None => log_convert_error(key, ValueOrigin::Environment, text),
            }
        }
        self.find_in_trees(key, tag)
            .and_then(|attribute| attribute.get::<bool>())
            .unwrap_or(false)
    }

    fn env_value(&self, key: &str) -> Option<&str> {
        self.sources
            .env
            .get(&env_name(&self.sources.env_prefix, key))
            .map(String::as_str)
    }

    fn tags<'a>(&'a self, tag: Option<&'a str>) -> Vec<&'a str> {
        tag.into_iter()
            .chain(self.sources.tags.iter().map(String::as_str))
            .collect()
    }

    fn find_in_trees(&self, key: &str, tag: Option<&str>) -> Option<Attribute> {
        let path = TreePath::from_dotted(key);
        let tags = self.tags(tag);
        for group in self.sources.groups() {
            for dir in &self.sources.search_dirs {
                for file in candidate_files(dir, group, &tags) {
                    let Some(document) = self.open(&file) else {
                        continue;
                    };
                    if let Some(attribute) = document.find_path(&path, &tags) {
                        tracing::debug!(key, file = %file.display(), "configuration value found");
                        return Some(attribute);
                    }
                }
            }
        }
        self.secrets()?.find_path(&path, &tags)
    }

    /// The parsed document at `file`, opened once per canonical path.
    fn open(&self, file: &Path) -> Option<Compound> {
        if !file.is_file() {
            return None;
        }
        let canonical = std::fs::canonicalize(file).ok()?;
        if let Some(document) = self.documents.borrow().get(&canonical) {
            return Some(document.clone());
        }
        let text = match std::fs::read_to_string(&canonical) {
            Ok(text) => text,
            Err(error) => {
                tracing::debug!(path = %canonical.display(), %error, "cannot read configuration file");
                return None;
            }
        };
        let document = match canonical.extension().and_then(|ext| ext.to_str()) {
            Some("json") => from_json_text(&text),
            _ => from_yaml_text(&text),
        };
        tracing::debug!(path = %canonical.display(), "opened configuration document");
        self.documents
            .borrow_mut()
            .insert(canonical, document.clone());
        Some(document)
    }

    fn secrets(&self) -> Option<Compound> {
        let dir = self.sources.secrets_dir.as_ref()?;
        let mut secrets = self.secrets.borrow_mut();
        Some(secrets.get_or_insert_with(|| from_filesystem_path(dir)).clone())
    }
}

/// `server.port` becomes `--server-port`.
pub fn arg_name(key: &str) -> String {
    let name: String = key
        .chars()
        .map(|c| if c == '.' || c == '_' { '-' } else { c })
        .collect();
    format!("--{name}")
}

/// `server.port` becomes `<PREFIX>_SERVER_PORT`.
pub fn env_name(prefix: &str, key: &str) -> String {
    let name: String = key
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}_{name}")
    }
}

/// Tagged variants first, in tag order, then the plain documents.
fn candidate_files(dir: &Path, group: &str, tags: &[&str]) -> Vec<PathBuf> {
    let tagged = tags.iter().flat_map(|tag| {
        EXTENSIONS
            .iter()
            .map(move |ext| dir.join(format!("{group}@{tag}.{ext}")))
    });
    let plain = EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{group}.{ext}")));
    tagged.chain(plain).collect()
}

/// Each occurrence of `name` in `args`, with its value: either the next
/// argument or the text after `name=`. A flag followed by another option or
/// by nothing has no value.
fn arg_occurrences<'a>(args: &'a [String], name: &str) -> Vec<Option<&'a str>> {
    let mut occurrences = Vec::new();
    for (index, arg) in args.iter().enumerate() {
        if arg == name {
            let value = args
                .get(index + 1)
                .map(String::as_str)
                .filter(|next| !next.starts_with("--"));
            occurrences.push(value);
        } else if let Some(value) = arg
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
        {
            occurrences.push(Some(value));
        }
    }
    occurrences
}

fn convert<T: FromText>(key: &str, origin: ValueOrigin, text: &str) -> Result<T> {
    T::from_text(text).ok_or_else(|| ConfigError::Convert {
        key: key.to_string(),
        origin,
        value: text.to_string(),
    })
}

fn log_convert_error(key: &str, origin: ValueOrigin, text: &str) {
    let error = ConfigError::Convert {
        key: key.to_string(),
        origin,
        value: text.to_string(),
    };
    tracing::error!(%error, "ignoring configuration value");
}

fn tree_values<T: FetchValue>(key: &str, attribute: &Attribute) -> Result<Vec<T>> {
    // Files hold one textual value, not one value per byte.
    if attribute.canonical_type() == ValueKind::Byte {
        return match attribute.value_count() {
            0 => Ok(Vec::new()),
            _ => attribute
                .get::<T>()
                .map(|value| vec![value])
                .ok_or_else(|| ConfigError::Fetch { key: key.to_string() }),
        };
    }
    let values = attribute.get_all::<T>();
    if values.len() < attribute.value_count() {
        return Err(ConfigError::Fetch { key: key.to_string() });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn config_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.yaml", "server:\n  port: 80\n  host: example.org\n");
        write(dir.path(), "app@prod.yaml", "server:\n  port: 443\n");
        write(dir.path(), "defaults.json", r#"{"timeout": "5s", "retries": 3}"#);
        dir
    }

    #[test]
    fn test_names() {
        assert_eq!(arg_name("server.max_conn"), "--server-max-conn");
        assert_eq!(env_name("APP", "server.max-conn"), "APP_SERVER_MAX_CONN");
        assert_eq!(env_name("", "port"), "PORT");
    }

    #[test]
    fn test_tagged_document_preferred() {
        let dir = config_dir();
        let sources = ConfigSources::new("app").with_search_dir(dir.path());
        let config = AppConfig::new(sources.clone());
        assert_eq!(config.fetch::<u16>("server.port", None), Some(80));
        assert_eq!(config.fetch::<u16>("server.port", Some("prod")), Some(443));

        let config = AppConfig::new(sources.with_tag("prod"));
        assert_eq!(config.fetch::<u16>("server.port", None), Some(443));
        // Keys missing from the tagged document come from the plain one.
        assert_eq!(
            config.fetch::<String>("server.host", None).as_deref(),
            Some("example.org")
        );
    }

    #[test]
    fn test_defaults_group() {
        let dir = config_dir();
        let config = AppConfig::new(ConfigSources::new("app").with_search_dir(dir.path()));
        assert_eq!(
            config.fetch::<std::time::Duration>("timeout", None),
            Some(std::time::Duration::from_secs(5))
        );
        assert_eq!(config.fetch::<i32>("retries", None), Some(3));
        assert_eq!(config.fetch::<i32>("missing", None), None);
    }

    #[test]
    fn test_argument_then_environment_then_tree() {
        let dir = config_dir();
        let base = ConfigSources::new("app").with_search_dir(dir.path());

        let config = AppConfig::new(
            base.clone()
                .with_env("APP_SERVER_PORT", "8080")
                .with_args(["--server-port", "9000"]),
        );
        assert_eq!(config.fetch::<u16>("server.port", None), Some(9000));

        let config = AppConfig::new(base.clone().with_env("APP_SERVER_PORT", "8080"));
        assert_eq!(config.fetch::<u16>("server.port", None), Some(8080));

        let config = AppConfig::new(base.with_args(["--server-port=not-a-number"]));
        assert_eq!(config.fetch::<u16>("server.port", None), Some(80));
    }

    #[test]
    fn test_fetch_all() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.yaml", "include: [c, d]\n");
        let config = AppConfig::new(
            ConfigSources::new("app")
                .with_search_dir(dir.path())
                .with_env("APP_INCLUDE", "e")
                .with_args(["--include", "a", "--other", "--include", "b"]),
        );
        let values: Vec<String> = config.fetch_all("include", None).unwrap();
        assert_eq!(values, vec!["a", "b", "e", "c", "d"]);
    }

    #[test]
    fn test_fetch_all_conversion_error() {
        let config = AppConfig::new(ConfigSources::new("app").with_args(["--level", "high"]));
        let error = config.fetch_all::<i32>("level", None).unwrap_err();
        assert_eq!(
            error,
            ConfigError::Convert {
                key: "level".to_string(),
                origin: ValueOrigin::Argument,
                value: "high".to_string(),
            }
        );

        let config = AppConfig::new(ConfigSources::new("app").with_args(["--level"]));
        assert!(matches!(
            config.fetch_all::<i32>("level", None),
            Err(ConfigError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_is_set() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.yaml", "verbose: yes\nquiet: false\n");
        let sources = ConfigSources::new("app").with_search_dir(dir.path());

        let config = AppConfig::new(sources.clone().with_args(["--dry-run", "--trace"]));
        assert!(config.is_set("dry_run", None));
        assert!(config.is_set("trace", None));
        assert!(config.is_set("verbose", None));
        assert!(!config.is_set("quiet", None));
        assert!(!config.is_set("absent", None));

        let config = AppConfig::new(sources.with_env("APP_VERBOSE", "off"));
        assert!(!config.is_set("verbose", None));
    }

    #[test]
    fn test_secrets_directory() {
        let dir = config_dir();
        let secrets = tempfile::tempdir().unwrap();
        fs::create_dir(secrets.path().join("db")).unwrap();
        write(&secrets.path().join("db"), "password", "hunter2\n");
        write(&secrets.path().join("db"), "password@prod", "correct-horse\n");

        let config = AppConfig::new(
            ConfigSources::new("app")
                .with_search_dir(dir.path())
                .with_secrets_dir(secrets.path()),
        );
        assert_eq!(
            config.fetch::<String>("db.password", None).as_deref(),
            Some("hunter2")
        );
        assert_eq!(
            config.fetch::<String>("db.password", Some("prod")).as_deref(),
            Some("correct-horse")
        );
    }

    #[test]
    fn test_reload_rereads_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.yaml", "level: 1\n");
        let config = AppConfig::new(ConfigSources::new("app").with_search_dir(dir.path()));
        assert_eq!(config.fetch::<i32>("level", None), Some(1));

        write(dir.path(), "app.yaml", "level: 2\n");
        assert_eq!(config.fetch::<i32>("level", None), Some(1));
        config.reload();
        assert_eq!(config.fetch::<i32>("level", None), Some(2));
    }

    #[test]
    fn test_group_from_arguments() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "shared.yaml", "region: eu\n");
        write(dir.path(), "shared@blue.yaml", "region: us\n");
        let config = AppConfig::new(
            ConfigSources::new("app")
                .with_search_dir(dir.path())
                .with_args(["--config-group", "shared", "--instance", "blue"]),
        );
        assert_eq!(config.fetch::<String>("region", None).as_deref(), Some("us"));
    }

    #[test]
    fn test_tags_inside_document() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.yaml", "port: 80\nport@prod: 443\n");
        let config = AppConfig::new(
            ConfigSources::new("app")
                .with_search_dir(dir.path())
                .with_tag("prod"),
        );
        assert_eq!(config.fetch::<u16>("port", None), Some(443));
    }
}
