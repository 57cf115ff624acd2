//! Config command implementation

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use valtree_config::{AppConfig, ConfigSources};

use super::find::value_strings;

/// Arguments for the config command
#[derive(Debug, Default)]
pub struct ConfigArgs {
    /// Application name
    pub app: String,
    /// Dotted key to look up
    pub key: String,
    /// Directories holding group documents
    pub dirs: Vec<PathBuf>,
    /// Directory tree holding secrets
    pub secrets: Option<PathBuf>,
    /// Variant tags, most specific first
    pub tags: Vec<String>,
    /// Additional configuration group
    pub group: Option<String>,
    /// Print every value
    pub all: bool,
}

/// Look up `args.key` the way the application would, with the process
/// environment but without the program arguments of this tool.
pub fn execute<W: Write>(args: ConfigArgs, out: &mut W) -> Result<()> {
    let sources = sources(&args).with_process_env();
    run(sources, &args, out)
}

fn sources(args: &ConfigArgs) -> ConfigSources {
    let mut sources = ConfigSources::new(args.app.as_str());
    sources.search_dirs = args.dirs.clone();
    sources.secrets_dir = args.secrets.clone();
    sources.tags = args.tags.clone();
    sources.group = args.group.clone();
    sources
}

fn run<W: Write>(sources: ConfigSources, args: &ConfigArgs, out: &mut W) -> Result<()> {
    let config = AppConfig::new(sources);
    if args.all {
        for value in config.fetch_all::<String>(&args.key, None)? {
            writeln!(out, "{value}")?;
        }
        return Ok(());
    }
    // JSON numbers and booleans do not fetch as strings; print them as shown.
    let value = config.fetch::<String>(&args.key, None).or_else(|| {
        let attribute = config.find(&args.key, None)?;
        value_strings(&attribute).into_iter().next()
    });
    match value {
        Some(value) => writeln!(out, "{value}")?,
        None => anyhow::bail!("no configuration value for '{}'", args.key),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn lookup(args: &ConfigArgs, sources: ConfigSources) -> Result<String> {
        let mut out = Vec::new();
        run(sources, args, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_config_lookup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("web.yaml"), "port: 80\nhosts: [a, b]\n").unwrap();
        fs::write(dir.path().join("web@prod.yaml"), "port: 443\n").unwrap();

        let mut args = ConfigArgs {
            app: "web".to_string(),
            key: "port".to_string(),
            dirs: vec![dir.path().to_path_buf()],
            ..ConfigArgs::default()
        };
        assert_eq!(lookup(&args, sources(&args)).unwrap(), "80\n");

        args.tags = vec!["prod".to_string()];
        assert_eq!(lookup(&args, sources(&args)).unwrap(), "443\n");

        args.key = "hosts".to_string();
        args.all = true;
        let with_env = sources(&args).with_env("WEB_HOSTS", "c");
        assert_eq!(lookup(&args, with_env).unwrap(), "c\na\nb\n");
    }

    #[test]
    fn test_config_json_number() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("web.json"), r#"{"port": 8080, "name": "web"}"#).unwrap();

        let mut args = ConfigArgs {
            app: "web".to_string(),
            key: "port".to_string(),
            dirs: vec![dir.path().to_path_buf()],
            ..ConfigArgs::default()
        };
        assert_eq!(lookup(&args, sources(&args)).unwrap(), "8080\n");

        args.key = "name".to_string();
        assert_eq!(lookup(&args, sources(&args)).unwrap(), "web\n");
    }

    #[test]
    fn test_config_missing_value() {
        let args = ConfigArgs {
            app: "web".to_string(),
            key: "port".to_string(),
            ..ConfigArgs::default()
        };
        let error = lookup(&args, sources(&args)).unwrap_err();
        assert_eq!(error.to_string(), "no configuration value for 'port'");
    }
}
