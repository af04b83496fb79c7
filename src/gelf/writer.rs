use std::net::UdpSocket;
use std::sync::atomic::{AtomicU64, Ordering};

use super::message::GelfMessage;

/// Datagram budget before chunking kicks in. 1420 keeps a chunk plus UDP and
/// IP headers under the usual 1500-byte ethernet MTU.
const MAX_DATAGRAM_SIZE: usize = 1420;

/// Chunked-datagram header: magic, 8-byte message id, sequence number and
/// sequence count.
const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
const CHUNK_HEADER_SIZE: usize = 12;

/// The sequence-count field is a single byte and collectors cap it at 128.
const MAX_CHUNK_COUNT: usize = 128;

static MESSAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {size} bytes needs {chunks} chunks, the limit is {MAX_CHUNK_COUNT}")]
    MessageTooLarge { size: usize, chunks: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Datagram transport for GELF messages. Owns one connected UDP socket for
/// the lifetime of the process.
pub struct GelfWriter {
    socket: UdpSocket,
}

impl GelfWriter {
    pub fn connect(address: &str) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(address)?;
        Ok(Self { socket })
    }

    /// Serialize and send one message, split into chunked datagrams when it
    /// exceeds the per-datagram budget. Oversized messages fail before any
    /// chunk is sent.
    pub fn send(&self, message: &GelfMessage) -> Result<(), WriterError> {
        let payload = serde_json::to_vec(message)?;

        if payload.len() <= MAX_DATAGRAM_SIZE {
            self.socket.send(&payload)?;
            return Ok(());
        }

        for chunk in chunk_payload(&payload, MAX_DATAGRAM_SIZE, next_message_id())? {
            self.socket.send(&chunk)?;
        }
        Ok(())
    }
}

/// Ids only need to be unique within the collector's reassembly window.
fn next_message_id() -> [u8; 8] {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64;
    let count = MESSAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
    (nanos ^ count.rotate_left(48)).to_be_bytes()
}

fn chunk_payload(
    payload: &[u8],
    max_size: usize,
    id: [u8; 8],
) -> Result<Vec<Vec<u8>>, WriterError> {
    let chunk_data = max_size - CHUNK_HEADER_SIZE;
    let count = payload.len().div_ceil(chunk_data);
    if count > MAX_CHUNK_COUNT {
        return Err(WriterError::MessageTooLarge {
            size: payload.len(),
            chunks: count,
        });
    }

    let mut chunks = Vec::with_capacity(count);
    for (seq, data) in payload.chunks(chunk_data).enumerate() {
        let mut chunk = Vec::with_capacity(CHUNK_HEADER_SIZE + data.len());
        chunk.extend_from_slice(&CHUNK_MAGIC);
        chunk.extend_from_slice(&id);
        chunk.push(seq as u8);
        chunk.push(count as u8);
        chunk.extend_from_slice(data);
        chunks.push(chunk);
    }
    Ok(chunks)
}
