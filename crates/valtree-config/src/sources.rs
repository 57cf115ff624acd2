//! Where configuration comes from.
//!
//! [`ConfigSources`] lists every input of a configuration lookup: the
//! program arguments, a snapshot of the environment, the directories that
//! hold configuration documents and the tags that select variants in them.
//! [`ConfigSources::discover`] fills it in for the running process;
//! [`ConfigSources::new`] starts empty, which is what tests want.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Group consulted after every application specific group.
pub const DEFAULTS_GROUP: &str = "defaults";

const INSTANCE_ARG: &str = "--instance";
const CONFIG_TAG_ARG: &str = "--config-tag";
const CONFIG_GROUP_ARG: &str = "--config-group";

#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Name of the application, the first group searched.
    pub app_name: String,
    /// Prefix stripped from the application name to form the second group.
    pub strip_prefix: Option<String>,
    /// Group named with `--config-group`.
    pub group: Option<String>,
    /// Directories searched for group documents, in order.
    pub search_dirs: Vec<PathBuf>,
    /// Directory tree consulted when no group document has a key.
    pub secrets_dir: Option<PathBuf>,
    /// Variant tags, most specific first.
    pub tags: Vec<String>,
    /// Prefix of environment variable names, without the trailing `_`.
    pub env_prefix: String,
    pub env: BTreeMap<String, String>,
    pub args: Vec<String>,
}

impl ConfigSources {
    pub fn new(app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        ConfigSources {
            env_prefix: env_prefix_for(&app_name),
            app_name,
            ..ConfigSources::default()
        }
    }

    /// Sources for the running process: user, system and installation
    /// configuration directories, the process environment and arguments,
    /// and the host name, architecture and build type as tags.
    pub fn discover(app_name: impl Into<String>) -> Self {
        let mut sources = ConfigSources::new(app_name);
        sources.search_dirs = default_search_dirs(&sources.app_name);
        if let Some(hostname) = hostname() {
            sources.tags.push(hostname);
        }
        sources.tags.push(std::env::consts::ARCH.to_string());
        sources = sources
            .with_process_env()
            .with_args(std::env::args().skip(1));
        if cfg!(debug_assertions) {
            sources.tags.push("debug".to_string());
        }
        tracing::debug!(
            app = %sources.app_name,
            dirs = sources.search_dirs.len(),
            tags = ?sources.tags,
            "discovered configuration sources"
        );
        sources
    }

    /// Record program arguments, picking up `--instance` and
    /// `--config-tag` as tags and `--config-group` as the group.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        for label in [INSTANCE_ARG, CONFIG_TAG_ARG] {
            if let Some(tag) = value_after(&self.args, label) {
                self.tags.push(tag.to_string());
            }
        }
        if let Some(group) = value_after(&self.args, CONFIG_GROUP_ARG) {
            self.group = Some(group.to_string());
        }
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn with_secrets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.secrets_dir = Some(dir.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Replace the environment snapshot with the variables of this process.
    pub fn with_process_env(mut self) -> Self {
        self.env = std::env::vars().collect();
        self
    }

    /// Groups to search, in order, without duplicates.
    pub fn groups(&self) -> Vec<&str> {
        let stripped = self
            .strip_prefix
            .as_deref()
            .and_then(|prefix| self.app_name.strip_prefix(prefix));
        let candidates = [
            Some(self.app_name.as_str()),
            stripped,
            self.group.as_deref(),
            Some(DEFAULTS_GROUP),
        ];
        let mut groups: Vec<&str> = Vec::new();
        for group in candidates.into_iter().flatten() {
            if !group.is_empty() && !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }
}

/// The argument following the first occurrence of `label`.
fn value_after<'a>(args: &'a [String], label: &str) -> Option<&'a str> {
    let position = args.iter().position(|arg| arg == label)?;
    args.get(position + 1).map(String::as_str)
}

fn env_prefix_for(app_name: &str) -> String {
    app_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn hostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

fn default_search_dirs(app_name: &str) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(project) = directories::ProjectDirs::from("", "", app_name) {
        dirs.push(project.config_dir().to_path_buf());
    }
    if cfg!(unix) {
        dirs.push(PathBuf::from("/etc").join(app_name));
    }
    if let Some(prefix) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(PathBuf::from))
    {
        dirs.push(prefix.join("etc").join(app_name));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_in_order() {
        let sources = ConfigSources::new("acme-server")
            .with_strip_prefix("acme-")
            .with_group("cluster");
        assert_eq!(sources.groups(), vec!["acme-server", "server", "cluster", "defaults"]);
    }

    #[test]
    fn test_groups_skip_duplicates() {
        let sources = ConfigSources::new("defaults").with_strip_prefix("x-");
        assert_eq!(sources.groups(), vec!["defaults"]);
    }

    #[test]
    fn test_args_provide_tags_and_group() {
        let sources = ConfigSources::new("app").with_tag("host").with_args([
            "--instance",
            "blue",
            "--config-group",
            "shared",
            "--config-tag",
            "canary",
        ]);
        assert_eq!(sources.tags, vec!["host", "blue", "canary"]);
        assert_eq!(sources.group.as_deref(), Some("shared"));
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(ConfigSources::new("my-app.v2").env_prefix, "MY_APP_V2");
    }
}
