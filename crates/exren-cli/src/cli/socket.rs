//! Daemon socket: server (during `exren serve`) and client (every other command).
//! Protocol: one JSON request per line; one or more JSON response lines each.

use anyhow::{Context, Result};
use exren_core::protocol::{decode_line, encode_line, Request, Response};
use exren_core::rehydrate::RehydrationStore;
use exren_core::retry::{run_with_retry, RetryPolicy};
use exren_core::service::Service;
use exren_core::store::DurableStore;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// Binds `path` and spawns a task serving requests with `service`. A stale
/// socket file is replaced. Each connection is served in its own task,
/// requests in arrival order.
pub fn spawn_listener<D, R>(
    service: Arc<Service<D, R>>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>>
where
    D: DurableStore + Send + Sync + 'static,
    R: RehydrationStore + Send + Sync + 'static,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let _ = std::fs::remove_file(path);
    let listener =
        UnixListener::bind(path).with_context(|| format!("bind socket: {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let service = Arc::clone(&service);
                    tokio::spawn(serve_connection(service, stream));
                }
                Err(e) => tracing::debug!("socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

async fn serve_connection<D, R>(service: Arc<Service<D, R>>, stream: UnixStream)
where
    D: DurableStore + Send + Sync,
    R: RehydrationStore + Send + Sync,
{
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handled = async {
            match decode_line::<Request>(&line) {
                Ok(request) => service.handle(request, tx).await,
                Err(e) => {
                    tracing::warn!("bad request: {:#}", e);
                    let _ = tx.send(Response::Error {
                        message: format!("{e:#}"),
                    });
                }
            }
        };
        let written = async {
            let mut ok = true;
            while let Some(response) = rx.recv().await {
                if ok {
                    if let Err(e) = write_response(&mut write, &response).await {
                        tracing::debug!("client went away: {:#}", e);
                        ok = false;
                    }
                }
            }
            ok
        };
        let ((), ok) = tokio::join!(handled, written);
        if !ok {
            return;
        }
    }
}

async fn write_response(write: &mut OwnedWriteHalf, response: &Response) -> Result<()> {
    let line = encode_line(response)?;
    write.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Connects to the daemon, retrying per `policy` while it is unavailable.
pub async fn connect(policy: &RetryPolicy, path: &Path) -> Result<UnixStream> {
    run_with_retry(policy, || async move {
        UnixStream::connect(path)
            .await
            .with_context(|| format!("connect to daemon at {}", path.display()))
    })
    .await
}

/// Sends `request` and passes every response to `on_response` until the
/// final one arrives.
pub async fn send_request(
    stream: UnixStream,
    request: &Request,
    mut on_response: impl FnMut(&Response),
) -> Result<()> {
    let (read, mut write) = stream.into_split();
    write
        .write_all(encode_line(request)?.as_bytes())
        .await
        .context("send request")?;

    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await.context("read response")? {
        let response: Response = decode_line(&line)?;
        on_response(&response);
        if response.is_final() {
            return Ok(());
        }
    }
    anyhow::bail!("daemon closed the connection before answering")
}

/// Connect (with retries) and send. `Err` means the caller should take its
/// fallback action.
pub async fn request(
    policy: &RetryPolicy,
    path: &Path,
    request: &Request,
    on_response: impl FnMut(&Response),
) -> Result<()> {
    let stream = connect(policy, path).await?;
    send_request(stream, request, on_response).await
}

/// [`request`] for requests answered by exactly one response.
pub async fn request_final(policy: &RetryPolicy, path: &Path, req: &Request) -> Result<Response> {
    let mut last = None;
    request(policy, path, req, |r| last = Some(r.clone())).await?;
    last.context("no response from daemon")
}
