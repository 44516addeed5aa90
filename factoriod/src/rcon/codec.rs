//! Source RCON wire framing.
//!
//! Each frame is `length (i32) | id (i32) | type (i32) | body | \0\0`, all
//! little-endian, where `length` counts everything after itself.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Login request carrying the password as body.
pub(crate) const SERVERDATA_AUTH: i32 = 3;

/// Command execution request.
pub(crate) const SERVERDATA_EXECCOMMAND: i32 = 2;

/// Login reply; id mirrors the request on success and is -1 on rejection.
pub(crate) const SERVERDATA_AUTH_RESPONSE: i32 = 2;

/// Command reply.
pub(crate) const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// Frames larger than this are treated as corruption, not data.
const MAX_BODY_LEN: usize = 1 << 20;

/// Bytes of a frame after the length prefix, excluding the body.
const FRAME_OVERHEAD: usize = 10;

/// One RCON frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// Encode for the wire.
    pub fn encode(&self) -> Bytes {
        let body = self.body.as_bytes();
        let length = FRAME_OVERHEAD + body.len();

        let mut buf = BytesMut::with_capacity(4 + length);
        buf.put_i32_le(length as i32);
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.kind);
        buf.put_slice(body);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.freeze()
    }

    /// Read one frame from `reader`.
    pub async fn read_from<R>(reader: &mut R) -> io::Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let length = reader.read_i32_le().await?;
        let length = usize::try_from(length)
            .ok()
            .filter(|len| (FRAME_OVERHEAD..=FRAME_OVERHEAD + MAX_BODY_LEN).contains(len))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("implausible frame length {}", length),
                )
            })?;

        let id = reader.read_i32_le().await?;
        let kind = reader.read_i32_le().await?;

        let mut body = vec![0u8; length - FRAME_OVERHEAD];
        reader.read_exact(&mut body).await?;

        let mut terminator = [0u8; 2];
        reader.read_exact(&mut terminator).await?;
        if terminator != [0, 0] {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "frame missing null terminators",
            ));
        }

        let body = String::from_utf8(body)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(Self { id, kind, body })
    }
}
