//! Per-connection session loop.
//!
//! One session per accepted stream. It reads up to `chunk_size` bytes at a
//! time, cuts them into sentences, and executes the engine's actions for
//! each sentence strictly in arrival order. A command that waits on an
//! actuator holds up only this connection.

use std::ops::ControlFlow;

use bytes::BytesMut;
use specmech_core::{Environment, ProtocolEngine, SessionAction};
use specmech_proto::SentenceBuffer;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ServerError;

/// One client connection.
pub struct Session<E>
where
    E: Environment,
{
    id: u64,
    engine: ProtocolEngine<E>,
    buffer: SentenceBuffer,
    chunk_size: usize,
}

impl<E> Session<E>
where
    E: Environment,
{
    /// Create a session. `chunk_size` bounds each read and the longest
    /// unterminated fragment kept between reads.
    pub fn new(id: u64, engine: ProtocolEngine<E>, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { id, engine, buffer: SentenceBuffer::new(chunk_size), chunk_size }
    }

    /// Session id used in logs.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Serve the stream until the peer disconnects or sends `q`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if reading or writing fails. Protocol
    /// errors never end the session.
    pub async fn run<S>(mut self, mut stream: S) -> Result<(), ServerError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut chunk = BytesMut::zeroed(self.chunk_size);

        loop {
            while let Some(sentence) = self.buffer.next_sentence() {
                if self.execute(&sentence, &mut stream).await?.is_break() {
                    stream.shutdown().await?;
                    return Ok(());
                }
            }

            let n = stream.read(&mut chunk[..]).await?;
            if n == 0 {
                if let Some(rest) = self.buffer.take_remainder() {
                    tracing::debug!(
                        session = self.id,
                        rest = %rest.escape_ascii(),
                        "discarding unterminated input"
                    );
                }
                return Ok(());
            }
            self.buffer.push(&chunk[..n]);
        }
    }

    async fn execute<S>(
        &self,
        sentence: &[u8],
        stream: &mut S,
    ) -> Result<ControlFlow<()>, ServerError>
    where
        S: AsyncWrite + Unpin,
    {
        tracing::debug!(session = self.id, input = %sentence.escape_ascii(), "recv");

        for action in self.engine.handle(sentence) {
            match action {
                SessionAction::Send(reply) => {
                    tracing::debug!(
                        session = self.id,
                        reply = %reply.as_bytes().escape_ascii(),
                        "send"
                    );
                    stream.write_all(reply.as_bytes()).await?;
                    stream.flush().await?;
                },
                SessionAction::Perform(operation) => self.engine.perform(operation).await,
                SessionAction::Close => return Ok(ControlFlow::Break(())),
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}
