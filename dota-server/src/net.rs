use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dota_graph::{dispatch, Request, Response, Storage, StorageError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::ServerError;

/// Accepts one connection at a time -- the listen backlog is 1 and a
/// connection is served to completion before the next is accepted, matching
/// the single-threaded, serial scheduling model. `shutdown` is checked
/// between accepts so a signal handler can stop the loop without aborting an
/// in-flight connection.
pub async fn serve(
    listener: TcpListener,
    storage: Storage,
    shutdown: Arc<AtomicBool>,
) -> Result<(), StorageError> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }

        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                continue;
            }
        };

        tracing::info!(%peer, "connection accepted");
        if let Err(e) = handle_connection(stream, &storage, &shutdown).await {
            match e {
                ServerError::Storage(StorageError::Io(io)) => {
                    tracing::error!(error = %io, "fatal storage I/O error, shutting down");
                    return Err(StorageError::Io(io));
                }
                other => tracing::warn!(error = %other, "connection closed with error"),
            }
        }
        tracing::info!(%peer, "connection closed");
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    storage: &Storage,
    shutdown: &Arc<AtomicBool>,
) -> Result<(), ServerError> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }

        let request = match read_frame(&mut stream).await {
            Ok(request) => request,
            Err(ServerError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        };

        let response = dispatch(storage, request)?;
        write_frame(&mut stream, &response).await?;
    }
}

/// Reads one `u32` length (network byte order) followed by that many bytes
/// of JSON-encoded message.
async fn read_frame(stream: &mut TcpStream) -> Result<Request, ServerError> {
    let len = stream.read_u32().await?;
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf).await?;
    Ok(serde_json::from_slice(&buf)?)
}

async fn write_frame(stream: &mut TcpStream, response: &Response) -> Result<(), ServerError> {
    let buf = serde_json::to_vec(response)?;
    stream.write_u32(buf.len() as u32).await?;
    stream.write_all(&buf).await?;
    stream.flush().await?;
    Ok(())
}

/// Binds a `TcpListener` with the configured port and a listen backlog of 1,
/// deliberate given the single-threaded model.
pub fn bind(port: u16) -> std::io::Result<TcpListener> {
    use socket2::{Domain, Socket, Type};
    use std::net::SocketAddr;

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}
