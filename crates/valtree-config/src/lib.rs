//! Application configuration on top of valtree.
//!
//! [`AppConfig`] answers "what is the value of `server.port`?" by asking,
//! in order, the program arguments, the environment and a set of YAML or
//! JSON group documents found in the configuration directories. Tags
//! (host name, architecture, `--instance`, `--config-tag`) select
//! variants both between documents (`app@prod.yaml`) and inside them
//! (`port@prod`).
//!
//! ```no_run
//! use valtree_config::{AppConfig, ConfigSources};
//!
//! let config = AppConfig::new(
//!     ConfigSources::new("my-server")
//!         .with_search_dir("/etc/my-server")
//!         .with_args(std::env::args().skip(1)),
//! );
//! let port: u16 = config.fetch("server.port", None).unwrap_or(8080);
//! ```

pub mod app_config;
pub mod error;
pub mod sources;

pub use app_config::{AppConfig, arg_name, env_name};
pub use error::{ConfigError, Result, ValueOrigin};
pub use sources::{ConfigSources, DEFAULTS_GROUP};
