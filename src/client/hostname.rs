//! One-shot hostname lookup for client construction.

use std::{ffi::OsString, io};

use log::error;

/// Hostname written when the local name cannot be determined.
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// Resolve the local hostname, falling back to [`UNKNOWN_HOSTNAME`].
///
/// Failures are logged rather than returned; a syslog line with a sentinel
/// hostname is preferable to no output at all.
pub fn resolve_hostname() -> String {
    hostname_or_unknown(hostname::get())
}

pub(crate) fn hostname_or_unknown(lookup: io::Result<OsString>) -> String {
    match lookup {
        Ok(name) if name.is_empty() => {
            error!("Could not get hostname: empty name. Setting to '{UNKNOWN_HOSTNAME}'.");
            UNKNOWN_HOSTNAME.to_owned()
        }
        Ok(name) => name
            .into_string()
            .unwrap_or_else(|raw| raw.to_string_lossy().into_owned()),
        Err(err) => {
            error!("Could not get hostname: {err}. Setting to '{UNKNOWN_HOSTNAME}'.");
            UNKNOWN_HOSTNAME.to_owned()
        }
    }
}
