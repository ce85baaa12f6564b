//! Drives an engine over a TCP connection to the module's UART.
//!
//! The engine writes into a `Vec<u8>`; after every step the buffer is
//! drained onto the socket. Received bytes are fed to the engine as they
//! arrive, and a fixed tick services the send queue and the poll scheduler.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, trace};
use wrf_session::{CommandSink, Engine, EngineConfig, SessionError};

use crate::handler::ConsoleHandler;

/// How often the send queue and poll scheduler are serviced.
const TICK: Duration = Duration::from_millis(20);

pub type LinkEngine = Engine<Vec<u8>, ConsoleHandler>;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("connection to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bridge closed the connection")]
    Closed,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub struct Link {
    stream: TcpStream,
    engine: LinkEngine,
    started: Instant,
}

impl Link {
    pub async fn connect(
        address: &str,
        handler: ConsoleHandler,
        config: EngineConfig,
    ) -> Result<Self, LinkError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| LinkError::Connect {
                address: address.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        info!("connected to {}", address);

        Ok(Link {
            stream,
            engine: Engine::new(Vec::new(), handler, config),
            started: Instant::now(),
        })
    }

    pub fn engine_mut(&mut self) -> &mut LinkEngine {
        &mut self.engine
    }

    /// Monotonic time since the link was opened.
    pub fn now(&self) -> Duration {
        self.started.elapsed()
    }

    /// Write out whatever the engine produced.
    async fn flush(&mut self) -> Result<(), LinkError> {
        if self.engine.writer().is_empty() {
            return Ok(());
        }
        let out = std::mem::take(self.engine.writer_mut());
        trace!("tx {} bytes", out.len());
        self.stream.write_all(&out).await?;
        Ok(())
    }

    /// Run until `done` holds, or until `timeout` expires.
    ///
    /// Without a timeout this only returns on error.
    pub async fn run_until<F>(&mut self, timeout: Option<Duration>, done: F) -> Result<(), LinkError>
    where
        F: Fn(&LinkEngine) -> bool,
    {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        let mut ticker = tokio::time::interval(TICK);
        let mut buf = [0u8; 512];

        loop {
            self.engine.handle_send_queue()?;
            self.flush().await?;
            if done(&self.engine) {
                return Ok(());
            }

            let expired = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                read = self.stream.read(&mut buf) => {
                    let n = read?;
                    if n == 0 {
                        return Err(LinkError::Closed);
                    }
                    trace!("rx {} bytes", n);
                    self.engine.register_bytes(&buf[..n])?;
                }
                _ = ticker.tick() => {
                    let now = self.started.elapsed();
                    if self.engine.handler_mut().poll.tick(now) {
                        debug!("polling");
                        self.engine.poll()?;
                    }
                }
                _ = expired => {
                    return Err(LinkError::Timeout(timeout.unwrap_or_default()));
                }
            }
        }
    }
}

/// Nothing queued, nothing outstanding, no upload in progress.
pub fn is_idle(engine: &LinkEngine) -> bool {
    engine.queue_count() == 0
        && !engine.is_awaiting_response()
        && !engine.is_file_transfer_pending()
        && !engine.is_file_transfer_active()
}
