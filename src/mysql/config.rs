use std::time::Duration;

use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};

use crate::config::DialectConfig;
use crate::error::OrmError;

const DEFAULT_PORT: u16 = 3306;
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_INACTIVE_TTL: Duration = Duration::from_secs(300);

/// Render the `mysql://` URL for `cfg`, percent-encoding the credentials.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` if host, user or database is missing.
pub fn connection_string(cfg: &DialectConfig) -> Result<String, OrmError> {
    let host = cfg.require("host", &cfg.host)?;
    let user = cfg.require("user", &cfg.user)?;
    let database = cfg.require("database", &cfg.database)?;

    let credentials = match &cfg.password {
        Some(password) => format!("{}:{}", encode_userinfo(user), encode_userinfo(password)),
        None => encode_userinfo(user),
    };
    Ok(format!(
        "mysql://{credentials}@{host}:{}/{database}",
        cfg.port.unwrap_or(DEFAULT_PORT)
    ))
}

fn encode_userinfo(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Pool constraints and lifetimes for `cfg`.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` when max open is zero.
pub fn pool_opts(cfg: &DialectConfig) -> Result<PoolOpts, OrmError> {
    let max = cfg.max_open_connections.unwrap_or(DEFAULT_POOL_SIZE) as usize;
    let min = (cfg.max_idle_connections.unwrap_or(0) as usize).min(max);
    if max == 0 {
        return Err(OrmError::ConfigurationError(
            "max_open_connections must be at least 1".to_string(),
        ));
    }
    let constraints = PoolConstraints::new(min, max).ok_or_else(|| {
        OrmError::ConfigurationError(format!(
            "invalid mysql pool constraints: min {min}, max {max}"
        ))
    })?;

    Ok(PoolOpts::default()
        .with_constraints(constraints)
        .with_inactive_connection_ttl(cfg.conn_max_idle_time().unwrap_or(DEFAULT_INACTIVE_TTL))
        .with_abs_conn_ttl(cfg.conn_max_lifetime()))
}

/// Parse the URL for `cfg` and create a pool. Connections open lazily.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` for incomplete settings or an unparseable URL.
pub fn build_pool(cfg: &DialectConfig) -> Result<(Pool, String), OrmError> {
    let url = connection_string(cfg)?;
    let opts = Opts::from_url(&url)
        .map_err(|e| OrmError::ConfigurationError(format!("invalid mysql url: {e}")))?;
    let opts = OptsBuilder::from_opts(opts).pool_opts(pool_opts(cfg)?);
    Ok((Pool::new(opts), url))
}
