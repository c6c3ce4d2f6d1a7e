//! Typed errors for the parts of NetWatch that need a name; everything else
//! propagates as `eyre::Result` the way the rest of the crate does.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngressError {
    #[error("failed to bind UDP listener on {0}")]
    Bind(std::net::SocketAddrV4, #[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("failed to bind TCP listener on {0}")]
    Bind(std::net::SocketAddrV4, #[source] std::io::Error),
}
