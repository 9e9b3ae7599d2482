//! INI configuration for the syslog output.
//!
//! Settings live in an `[output.syslog]` section and are parsed with the
//! `rust-ini` crate into a [`SyslogClientBuilder`], so file and programmatic
//! configuration share one validation path.
//!
//! ```ini
//! [output.syslog]
//! host = logs.example.com
//! port = 6514
//! tls = true
//! program = beat
//! priority = 1
//! severity = 6
//! ```

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    str::FromStr,
};

use ini::Ini;
use thiserror::Error;

use crate::builder::{BuildError, SyslogClientBuilder, SyslogOutputConfig};

/// Section holding the syslog output settings.
pub const SECTION: &str = "output.syslog";
/// TCP port used when `host` is given without `port`.
pub const DEFAULT_PORT: u16 = 514;

/// Errors raised while loading an INI configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} doesn't exist", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid ini: {0}")]
    Parse(String),
    #[error("missing [output.syslog] section")]
    MissingSection,
    #[error("unknown key `{0}` in [output.syslog]")]
    UnknownKey(String),
    #[error("invalid value {value:?} for key `{key}`")]
    InvalidValue { key: String, value: String },
    #[error("`host` and `unix_path` are mutually exclusive")]
    ConflictingTransport,
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Read `path` and parse its `[output.syslog]` section.
pub fn load_ini_file(path: impl AsRef<Path>) -> Result<SyslogClientBuilder, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    })?;
    parse_ini_str(&text)
}

/// Read `path` and validate it into a ready [`SyslogOutputConfig`].
pub fn load_output_config(path: impl AsRef<Path>) -> Result<SyslogOutputConfig, ConfigError> {
    Ok(load_ini_file(path)?.build_config()?)
}

#[derive(Default)]
struct RawSettings {
    host: Option<String>,
    port: Option<u16>,
    unix_path: Option<PathBuf>,
    tls: Option<bool>,
    tls_domain: Option<String>,
    tls_insecure: Option<bool>,
}

/// Parse INI text into a builder.
///
/// Only syntax and value types are checked here; semantic validation happens
/// when the builder is built.
pub fn parse_ini_str(text: &str) -> Result<SyslogClientBuilder, ConfigError> {
    let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
    let section = ini
        .section(Some(SECTION))
        .ok_or(ConfigError::MissingSection)?;

    let mut raw = RawSettings::default();
    let mut builder = SyslogClientBuilder::new();
    for (key, value) in section.iter() {
        let value = value.trim();
        match key {
            "host" => raw.host = Some(value.to_owned()),
            "port" => raw.port = Some(parse_value(key, value)?),
            "unix_path" => raw.unix_path = Some(PathBuf::from(value)),
            "tls" => raw.tls = Some(parse_bool(key, value)?),
            "tls_domain" => raw.tls_domain = Some(value.to_owned()),
            "tls_insecure" => raw.tls_insecure = Some(parse_bool(key, value)?),
            "program" => builder = builder.with_program(value),
            "hostname" => builder = builder.with_hostname(value),
            "priority" => builder = builder.with_priority(parse_value(key, value)?),
            "severity" => builder = builder.with_severity(parse_value(key, value)?),
            "connect_timeout_ms" => {
                builder = builder.with_connect_timeout_ms(parse_value(key, value)?)
            }
            "write_timeout_ms" => builder = builder.with_write_timeout_ms(parse_value(key, value)?),
            "warn_interval_ms" => builder = builder.with_warn_interval_ms(parse_value(key, value)?),
            other => return Err(ConfigError::UnknownKey(other.to_owned())),
        }
    }
    apply_transport(builder, raw)
}

fn apply_transport(
    mut builder: SyslogClientBuilder,
    raw: RawSettings,
) -> Result<SyslogClientBuilder, ConfigError> {
    builder = match (raw.host, raw.unix_path) {
        (Some(_), Some(_)) => return Err(ConfigError::ConflictingTransport),
        (Some(host), None) => builder.with_tcp(host, raw.port.unwrap_or(DEFAULT_PORT)),
        (None, Some(path)) => builder.with_unix_path(path),
        (None, None) => builder,
    };
    if raw.tls.unwrap_or(false) {
        builder = builder.with_tls(raw.tls_domain, raw.tls_insecure.unwrap_or(false));
    }
    Ok(builder)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}
