//! Length-prefixed JSON framing over the driver's stdio pipes.
//!
//! Every message is a 4-byte little-endian length followed by that many bytes
//! of UTF-8 JSON. The sending half is owned by the [`Connection`]; the
//! receiving half runs as its own task and forwards decoded messages over an
//! unbounded channel.
//!
//! [`Connection`]: crate::connection::Connection

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Upper bound for a single inbound frame.
const MAX_FRAME_BYTES: usize = 256 * 1024 * 1024;

/// Type-erased writer used by the connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Writing half of the pipe transport.
pub struct PipeSender<W> {
	writer: W,
}

impl<W> PipeSender<W>
where
	W: AsyncWrite + Unpin,
{
	pub fn new(writer: W) -> Self {
		Self { writer }
	}

	/// Serializes and writes one framed message.
	pub async fn send(&mut self, message: &Value) -> Result<()> {
		let bytes = serde_json::to_vec(message)?;
		let len = u32::try_from(bytes.len()).map_err(|_| Error::ProtocolError(format!("outbound message too large: {} bytes", bytes.len())))?;

		self.writer.write_all(&len.to_le_bytes()).await?;
		self.writer.write_all(&bytes).await?;
		self.writer.flush().await?;
		Ok(())
	}
}

/// Reading half of the pipe transport.
pub struct PipeReceiver<R> {
	reader: R,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl<R> PipeReceiver<R>
where
	R: AsyncRead + Unpin,
{
	/// Reads frames until EOF or until the consumer goes away.
	///
	/// A clean EOF on a frame boundary ends the loop with `Ok(())`.
	pub async fn run(mut self) -> Result<()> {
		loop {
			let mut header = [0u8; 4];
			match self.reader.read_exact(&mut header).await {
				Ok(_) => {}
				Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
					tracing::debug!(target = "unipfp.runtime", "driver pipe closed");
					return Ok(());
				}
				Err(e) => return Err(e.into()),
			}

			let len = u32::from_le_bytes(header) as usize;
			if len > MAX_FRAME_BYTES {
				return Err(Error::ProtocolError(format!("inbound frame of {len} bytes exceeds limit")));
			}

			let mut body = vec![0u8; len];
			self.reader.read_exact(&mut body).await?;

			let message: Value = serde_json::from_slice(&body)?;
			if self.message_tx.send(message).is_err() {
				return Ok(());
			}
		}
	}
}

/// Splits a writer/reader pair into the transport halves plus the inbound message stream.
pub fn pipe<W, R>(writer: W, reader: R) -> (PipeSender<W>, PipeReceiver<R>, mpsc::UnboundedReceiver<Value>)
where
	W: AsyncWrite + Unpin,
	R: AsyncRead + Unpin,
{
	let (message_tx, message_rx) = mpsc::unbounded_channel();
	(PipeSender::new(writer), PipeReceiver { reader, message_tx }, message_rx)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use tokio::io::duplex;

	#[tokio::test]
	async fn send_writes_little_endian_length_prefix() {
		let (client, mut server) = duplex(1024);
		let (_unused_client, unused_server) = duplex(16);
		let (mut sender, _receiver, _rx) = pipe(client, unused_server);

		sender.send(&json!({"id": 1})).await.unwrap();

		let mut header = [0u8; 4];
		server.read_exact(&mut header).await.unwrap();
		let len = u32::from_le_bytes(header) as usize;
		let mut body = vec![0u8; len];
		server.read_exact(&mut body).await.unwrap();

		assert_eq!(body, br#"{"id":1}"#);
	}

	#[tokio::test]
	async fn receiver_decodes_consecutive_frames() {
		let (mut driver_side, client_side) = duplex(1024);
		let (unused_writer, _unused_reader) = duplex(16);
		let (_sender, receiver, mut rx) = pipe(unused_writer, client_side);

		for payload in [r#"{"id":0,"result":{}}"#, r#"{"guid":"page@1","method":"close","params":{}}"#] {
			driver_side.write_all(&(payload.len() as u32).to_le_bytes()).await.unwrap();
			driver_side.write_all(payload.as_bytes()).await.unwrap();
		}
		drop(driver_side);

		receiver.run().await.unwrap();

		assert_eq!(rx.recv().await.unwrap()["id"], 0);
		assert_eq!(rx.recv().await.unwrap()["method"], "close");
		assert!(rx.recv().await.is_none());
	}

	#[tokio::test]
	async fn receiver_rejects_oversized_frames() {
		let (mut driver_side, client_side) = duplex(64);
		let (unused_writer, _unused_reader) = duplex(16);
		let (_sender, receiver, _rx) = pipe(unused_writer, client_side);

		driver_side.write_all(&u32::MAX.to_le_bytes()).await.unwrap();

		let err = receiver.run().await.unwrap_err();
		assert!(matches!(err, Error::ProtocolError(msg) if msg.contains("exceeds limit")));
	}
}
