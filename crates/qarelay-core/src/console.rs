//! Console session connector: turns input lines into messages and prints replies.
//!
//! Every line is a message from one fixed sender. Runs until the `shutdown` token is
//! cancelled or the input is closed.

use std::{io::BufRead, thread};

use async_trait::async_trait;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::{mpsc, Mutex},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    domain::SenderId,
    messaging::{
        port::SessionConnector,
        types::{InboundMessage, SessionEvent},
    },
    Result,
};

pub const CONSOLE_SENDER: &str = "console";

/// Read `reader` line by line on a dedicated OS thread.
///
/// Blocking reads (stdin) cannot be cancelled, so they must not live on the runtime: the
/// thread is detached and dies with the process. The channel closes at end of input, after
/// a read error, or once the receiver is dropped and the next line arrives.
pub fn spawn_line_reader<R>(reader: R, capacity: usize) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub struct ConsoleConnector<W> {
    sender: SenderId,
    out: Mutex<W>,
}

impl<W> ConsoleConnector<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W) -> Self {
        Self {
            sender: SenderId::from(CONSOLE_SENDER),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Pump `lines` into `events` as messages from the console sender.
    pub async fn run(
        &self,
        mut lines: mpsc::Receiver<std::io::Result<String>>,
        events: mpsc::Sender<SessionEvent>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        if events.send(SessionEvent::Ready).await.is_err() {
            return Ok(());
        }
        info!("console connector started; type a question and press Enter");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("console connector shutting down");
                    return Ok(());
                }

                line = lines.recv() => {
                    let Some(line) = line else {
                        let _ = events
                            .send(SessionEvent::Disconnected("end of input".to_string()))
                            .await;
                        return Ok(());
                    };
                    let msg = InboundMessage {
                        sender: self.sender.clone(),
                        text: line?,
                    };
                    if events.send(SessionEvent::Message(msg)).await.is_err() {
                        // Relay loop is gone.
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<W> SessionConnector for ConsoleConnector<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        "console"
    }

    async fn send_text(&self, to: &SenderId, text: &str) -> Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(format!("{to}: {text}\n").as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}
