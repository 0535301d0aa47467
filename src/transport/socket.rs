//! Broker socket: one TCP connection per endpoint, re-established in the
//! background whenever it is lost.

use super::endpoint::Endpoint;
use super::gate::Gate;
use crate::error::{Result, WireError};
use bytes::BytesMut;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

/// Callback fired before every connection attempt with its 1-based number.
pub type ReconnectObserver = Arc<dyn Fn(u32) + Send + Sync>;

/// Connection and backoff settings.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Delay before the first connection attempt.
    pub connect_delay: Duration,
    /// Wait after the first failed attempt.
    pub reconnect_backoff: Duration,
    /// Factor applied to the wait after each further failure.
    pub backoff_multiplier: u32,
    /// How long `dispose` waits for a running reconnection to unwind.
    pub dispose_grace: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            connect_delay: Duration::ZERO,
            reconnect_backoff: Duration::from_millis(500),
            backoff_multiplier: 2,
            dispose_grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SocketState {
    Disconnected,
    Connecting,
    Connected,
    Disposed,
}

struct Connection {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
}

impl Connection {
    fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }
}

struct Inner {
    endpoint: Endpoint,
    config: SocketConfig,
    /// Held for the whole of a read so byte runs from two callers never interleave.
    read_gate: Mutex<()>,
    /// Open only while `connection` holds a live connection.
    connected: Gate,
    connection: parking_lot::Mutex<Option<Arc<Connection>>>,
    reconnecting: AtomicUsize,
    dispose_count: AtomicUsize,
    dispose_token: CancellationToken,
    observer: Option<ReconnectObserver>,
    connect_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Exclusive-read, reconnecting TCP socket to a single broker.
///
/// Reads are serialized: a second `read_*` call waits until the first has
/// resolved. Each `write_frame` call puts its whole frame on the wire before
/// another writer may start. Requests and responses are not paired here;
/// callers match them by correlation id.
///
/// Construction must happen inside a tokio runtime. Dropping the socket
/// stops any background reconnection; [`dispose`](Self::dispose) does the
/// same and also waits for it to finish.
pub struct BrokerSocket {
    inner: Arc<Inner>,
}

impl BrokerSocket {
    pub fn new(endpoint: Endpoint, config: SocketConfig) -> Self {
        Self::build(endpoint, config, None)
    }

    pub fn with_observer(
        endpoint: Endpoint,
        config: SocketConfig,
        observer: impl Fn(u32) + Send + Sync + 'static,
    ) -> Self {
        Self::build(endpoint, config, Some(Arc::new(observer)))
    }

    fn build(endpoint: Endpoint, config: SocketConfig, observer: Option<ReconnectObserver>) -> Self {
        let inner = Arc::new(Inner {
            endpoint,
            config,
            read_gate: Mutex::new(()),
            connected: Gate::blocked(),
            connection: parking_lot::Mutex::new(None),
            reconnecting: AtomicUsize::new(0),
            dispose_count: AtomicUsize::new(0),
            dispose_token: CancellationToken::new(),
            observer,
            connect_task: parking_lot::Mutex::new(None),
        });

        let first = Arc::clone(&inner);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = first.dispose_token.cancelled() => {}
                _ = tokio::time::sleep(first.config.connect_delay) => {
                    first.trigger_reconnection(None);
                }
            }
        });
        let mut task = inner.connect_task.lock();
        if task.is_none() {
            *task = Some(handle);
        }
        drop(task);

        Self { inner }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    pub fn state(&self) -> SocketState {
        let inner = &self.inner;
        if inner.dispose_token.is_cancelled() {
            SocketState::Disposed
        } else if inner.connected.is_open() && inner.connection.lock().is_some() {
            SocketState::Connected
        } else if inner.reconnecting.load(Ordering::SeqCst) > 0 {
            SocketState::Connecting
        } else {
            SocketState::Disconnected
        }
    }

    /// Read exactly `n` bytes, waiting for a connection if there is none.
    pub async fn read_exact(&self, n: usize) -> Result<BytesMut> {
        self.read_exact_cancellable(n, &CancellationToken::new()).await
    }

    pub async fn read_exact_cancellable(
        &self,
        n: usize,
        cancel: &CancellationToken,
    ) -> Result<BytesMut> {
        let _gate = self.inner.lock_reader(cancel).await?;
        let mut buf = BytesMut::zeroed(n);
        self.inner.read_into(&mut buf, cancel).await?;
        Ok(buf)
    }

    /// Read one response frame: the 4-byte length, then that many bytes.
    /// Returns the body without its length prefix.
    ///
    /// A negative or oversized length fails with `Protocol` and starts a
    /// reconnection, since the rest of the stream cannot be framed.
    pub async fn read_frame(&self) -> Result<BytesMut> {
        self.read_frame_cancellable(&CancellationToken::new()).await
    }

    pub async fn read_frame_cancellable(&self, cancel: &CancellationToken) -> Result<BytesMut> {
        let _gate = self.inner.lock_reader(cancel).await?;
        let mut prefix = [0u8; 4];
        self.inner.read_into(&mut prefix, cancel).await?;
        let length = i32::from_be_bytes(prefix);
        if length < 0 || length as usize > MAX_FRAME_LEN {
            // The stream can no longer be framed; drop it and reconnect.
            let current = self.inner.connection.lock().clone();
            if let Some(current) = current {
                self.inner.trigger_reconnection(Some(&current));
            }
            warn!(endpoint = %self.inner.endpoint, length, "invalid frame length, resetting connection");
            return Err(WireError::Protocol(format!(
                "invalid frame length {} from {}",
                length, self.inner.endpoint
            )));
        }
        let mut body = BytesMut::zeroed(length as usize);
        self.inner.read_into(&mut body, cancel).await?;
        debug!(endpoint = %self.inner.endpoint, len = body.len(), "frame received");
        Ok(body)
    }

    /// Write a complete, already length-prefixed frame.
    pub async fn write_frame(&self, frame: &[u8]) -> Result<()> {
        self.write_frame_cancellable(frame, &CancellationToken::new())
            .await
    }

    /// Cancellation is honored until the frame starts going out; a frame is
    /// never abandoned half-written.
    pub async fn write_frame_cancellable(
        &self,
        frame: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let inner = &self.inner;
        let connection = inner.live_connection(cancel).await?;
        let mut writer = tokio::select! {
            biased;
            _ = inner.dispose_token.cancelled() => return Err(inner.disposed()),
            _ = cancel.cancelled() => return Err(WireError::Cancelled),
            guard = connection.writer.lock() => guard,
        };
        let written = tokio::select! {
            _ = inner.dispose_token.cancelled() => return Err(inner.disposed()),
            result = async {
                writer.write_all(frame).await?;
                writer.flush().await
            } => result,
        };
        drop(writer);
        match written {
            Ok(()) => {
                debug!(endpoint = %inner.endpoint, len = frame.len(), "frame written");
                Ok(())
            }
            Err(e) => {
                inner.trigger_reconnection(Some(&connection));
                Err(inner.io_error(e))
            }
        }
    }

    /// Stop reconnecting and release the connection. Only the first call
    /// does anything; operations waiting on the socket fail as disposed.
    pub async fn dispose(&self) {
        let inner = &self.inner;
        if inner.dispose_count.fetch_add(1, Ordering::SeqCst) != 0 {
            return;
        }
        inner.dispose_token.cancel();
        let task = inner.connect_task.lock().take();
        if let Some(task) = task {
            if tokio::time::timeout(inner.config.dispose_grace, task)
                .await
                .is_err()
            {
                warn!(endpoint = %inner.endpoint, "reconnection did not stop within the grace period");
            }
        }
        inner.connection.lock().take();
    }
}

impl Drop for BrokerSocket {
    fn drop(&mut self) {
        self.inner.dispose_token.cancel();
    }
}

impl Inner {
    fn disposed(&self) -> WireError {
        WireError::Disposed(self.endpoint.to_string())
    }

    fn io_error(&self, e: std::io::Error) -> WireError {
        if self.dispose_token.is_cancelled() {
            self.disposed()
        } else {
            WireError::Io(e)
        }
    }

    async fn lock_reader(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, ()>> {
        tokio::select! {
            biased;
            _ = self.dispose_token.cancelled() => Err(self.disposed()),
            _ = cancel.cancelled() => Err(WireError::Cancelled),
            guard = self.read_gate.lock() => Ok(guard),
        }
    }

    /// Wait for the connected gate, then take the live connection.
    async fn live_connection(&self, cancel: &CancellationToken) -> Result<Arc<Connection>> {
        tokio::select! {
            biased;
            _ = self.dispose_token.cancelled() => return Err(self.disposed()),
            _ = cancel.cancelled() => return Err(WireError::Cancelled),
            _ = self.connected.wait_open() => {}
        }
        self.connection
            .lock()
            .clone()
            .ok_or_else(|| WireError::ServerUnreachable(self.endpoint.to_string()))
    }

    /// Fill `buf` completely. The caller holds the read gate.
    async fn read_into(self: &Arc<Self>, buf: &mut [u8], cancel: &CancellationToken) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let connection = self.live_connection(cancel).await?;
            let read = {
                let mut reader = connection.reader.lock().await;
                tokio::select! {
                    biased;
                    _ = self.dispose_token.cancelled() => return Err(self.disposed()),
                    _ = cancel.cancelled() => return Err(WireError::Cancelled),
                    result = reader.read(&mut buf[filled..]) => result,
                }
            };
            match read {
                Ok(0) => {
                    self.trigger_reconnection(Some(&connection));
                    if self.dispose_token.is_cancelled() {
                        return Err(self.disposed());
                    }
                    return Err(WireError::ServerDisconnected(self.endpoint.to_string()));
                }
                Ok(n) => filled += n,
                Err(e) => {
                    self.trigger_reconnection(Some(&connection));
                    return Err(self.io_error(e));
                }
            }
        }
        Ok(())
    }

    /// Start a background reconnection unless one is already running.
    ///
    /// With `failed` set, nothing happens if that connection has already
    /// been replaced.
    fn trigger_reconnection(self: &Arc<Self>, failed: Option<&Arc<Connection>>) {
        if self.dispose_token.is_cancelled() {
            return;
        }
        if let Some(failed) = failed {
            let current = self.connection.lock();
            if !current.as_ref().is_some_and(|c| Arc::ptr_eq(c, failed)) {
                return;
            }
        }
        if self.reconnecting.fetch_add(1, Ordering::SeqCst) != 0 {
            self.reconnecting.fetch_sub(1, Ordering::SeqCst);
            return;
        }

        self.connected.block();
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            inner.reestablish().await;
            inner.reconnecting.fetch_sub(1, Ordering::SeqCst);
            inner.connected.open();
        });
        *self.connect_task.lock() = Some(handle);
    }

    async fn reestablish(&self) {
        warn!(endpoint = %self.endpoint, "no connection, attempting to re-connect");
        self.connection.lock().take();

        let mut attempt: u32 = 1;
        let mut delay = self.config.reconnect_backoff;
        while !self.dispose_token.is_cancelled() {
            if let Some(observer) = &self.observer {
                observer(attempt);
            }
            let connected = tokio::select! {
                _ = self.dispose_token.cancelled() => return,
                result = TcpStream::connect(self.endpoint.addr()) => result,
            };
            match connected {
                Ok(stream) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(endpoint = %self.endpoint, error = %e, "set_nodelay failed");
                    }
                    *self.connection.lock() = Some(Arc::new(Connection::new(stream)));
                    warn!(endpoint = %self.endpoint, attempt, "connection established");
                    return;
                }
                Err(e) => {
                    warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "failed re-connection, will retry"
                    );
                }
            }

            tokio::select! {
                _ = self.dispose_token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = delay
                .checked_mul(self.config.backoff_multiplier)
                .unwrap_or(delay);
            attempt = attempt.saturating_add(1);
        }
    }
}
