//! TCP listener: accepts rack connections indefinitely, spawning one task
//! per connection so a slow or stalled rack can't block the others.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use socket2::{Domain, Socket, Type};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use crate::dc::{connection, DcState};
use crate::error::ListenerError;

fn bind_listener(host: Ipv4Addr, port: u16, backlog: i32) -> eyre::Result<std::net::TcpListener> {
    let address = std::net::SocketAddrV4::new(host, port);
    let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket
        .bind(&SocketAddr::V4(address).into())
        .map_err(|e| ListenerError::Bind(address, e))?;
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

/// Run the DC listener until shutdown fires. Each accepted connection is
/// handled on its own `tokio::spawn`ed task.
pub async fn run(
    state: Arc<DcState>,
    host: Ipv4Addr,
    port: u16,
    num_racks: usize,
    mut shutdown: broadcast::Receiver<()>,
) -> eyre::Result<()> {
    let backlog = (num_racks + 5) as i32;
    let std_listener = bind_listener(host, port, backlog)?;
    let listener = TcpListener::from_std(std_listener)?;
    info!("dc {} listening on {host}:{port}/tcp", state.dc_id);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("dc listener task stopping");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, _addr) = accepted?;
                let state = Arc::clone(&state);
                tokio::spawn(connection::handle(state, stream));
            }
        }
    }
}
