//! Environment-based configuration for the three process roles. This mirrors
//! the source's `netwatch.config` module: small typed structs with a
//! `from_env` constructor and a default for every field, not a CLI parser —
//! spec §6 defines configuration purely as named environment variables. A
//! present-but-unparseable value is a fatal startup error, not a silent
//! fallback to the default, matching the source's `int(v)`/`float(v)`
//! conversions (which raise on a bad value rather than swallowing it).

use std::net::Ipv4Addr;

use eyre::WrapErr;

fn getenv_parsed<T>(name: &str, default: T) -> eyre::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .wrap_err_with(|| format!("{name}={v:?} is not a valid value")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e).wrap_err_with(|| format!("failed to read {name}")),
    }
}

fn getenv_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct ServerAgentConfig {
    pub rack_id: i64,
    pub server_id: i64,
    pub rack_controller_host: String,
    pub rack_controller_port: u16,
    pub interval_sec: f64,
}

impl ServerAgentConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            rack_id: getenv_parsed("RACK_ID", 0)?,
            server_id: getenv_parsed("SERVER_ID", 0)?,
            rack_controller_host: getenv_string("RACK_CONTROLLER_HOST", "127.0.0.1"),
            rack_controller_port: getenv_parsed("RACK_CONTROLLER_PORT", 9999)?,
            interval_sec: getenv_parsed("INTERVAL_SEC", 0.05)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RackAggregatorConfig {
    pub rack_id: i64,
    pub udp_listen_host: Ipv4Addr,
    pub udp_listen_port: u16,
    pub dc_controller_host: String,
    pub dc_controller_port: u16,
    pub metrics_port: u16,
}

impl RackAggregatorConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            rack_id: getenv_parsed("RACK_ID", 0)?,
            udp_listen_host: getenv_parsed("UDP_LISTEN_HOST", Ipv4Addr::UNSPECIFIED)?,
            udp_listen_port: getenv_parsed("UDP_LISTEN_PORT", 9999)?,
            dc_controller_host: getenv_string("DC_CONTROLLER_HOST", "127.0.0.1"),
            dc_controller_port: getenv_parsed("DC_CONTROLLER_PORT", 9990)?,
            metrics_port: getenv_parsed("METRICS_PORT", 8000)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DcAggregatorConfig {
    pub dc_id: i64,
    pub tcp_listen_host: Ipv4Addr,
    pub tcp_listen_port: u16,
    pub num_racks: usize,
    pub metrics_port: u16,
}

impl DcAggregatorConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            dc_id: getenv_parsed("DC_ID", 0)?,
            tcp_listen_host: getenv_parsed("TCP_LISTEN_HOST", Ipv4Addr::UNSPECIFIED)?,
            tcp_listen_port: getenv_parsed("TCP_LISTEN_PORT", 9990)?,
            num_racks: getenv_parsed("NUM_RACKS", 4)?,
            metrics_port: getenv_parsed("METRICS_PORT", 8000)?,
        })
    }
}
