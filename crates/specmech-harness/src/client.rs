//! Line-protocol client for simulated controllers.

use std::io;

use bytes::BytesMut;
use specmech_proto::PROMPT;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use turmoil::net::TcpStream;

use crate::SIM_PORT;

/// Minimal controller client: write commands, read reply bytes.
pub struct ControllerClient {
    stream: TcpStream,
    pending: BytesMut,
}

impl ControllerClient {
    /// Connect to the emulator on simulated host `host`.
    pub async fn connect(host: &str) -> io::Result<Self> {
        let stream = TcpStream::connect((host, SIM_PORT)).await?;
        Ok(Self { stream, pending: BytesMut::with_capacity(256) })
    }

    /// Write raw command bytes, terminator included.
    pub async fn send(&mut self, command: &str) -> io::Result<()> {
        self.stream.write_all(command.as_bytes()).await
    }

    /// Read exactly as many bytes as `expected` and compare.
    pub async fn expect(&mut self, expected: &str) -> io::Result<()> {
        let got = self.read_exact(expected.len()).await?;
        if got == expected {
            Ok(())
        } else {
            Err(io::Error::other(format!("expected {expected:?}, got {got:?}")))
        }
    }

    /// Read `len` bytes.
    pub async fn read_exact(&mut self, len: usize) -> io::Result<String> {
        while self.pending.len() < len {
            self.fill().await?;
        }
        Ok(String::from_utf8_lossy(&self.pending.split_to(len)).into_owned())
    }

    /// Read through the next `>` prompt: a full ack or report reply.
    pub async fn read_reply(&mut self) -> io::Result<String> {
        loop {
            if let Some(end) = self.pending.iter().position(|&b| char::from(b) == PROMPT) {
                return Ok(String::from_utf8_lossy(&self.pending.split_to(end + 1)).into_owned());
            }
            self.fill().await?;
        }
    }

    /// Send a command and read its reply.
    pub async fn request(&mut self, command: &str) -> io::Result<String> {
        self.send(command).await?;
        self.read_reply().await
    }

    /// Read until the server closes the connection.
    pub async fn read_to_end(&mut self) -> io::Result<String> {
        let mut rest = Vec::new();
        self.stream.read_to_end(&mut rest).await?;
        let mut out = String::from_utf8_lossy(&self.pending.split()).into_owned();
        out.push_str(&String::from_utf8_lossy(&rest));
        Ok(out)
    }

    async fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; 256];
        let n = self.stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        self.pending.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}
