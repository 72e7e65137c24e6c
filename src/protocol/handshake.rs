//! Connection handshake.
//!
//! Before any transaction is exchanged the client announces the protocol and
//! the server accepts or refuses it:
//!
//! ```text
//! client -> server: "TRTP" "HOTL" [version u16] [sub_version u16]   (12 bytes)
//! server -> client: "TRTP" [error_code u32]                          (8 bytes)
//! ```
//!
//! A non-zero error code means the server refused the connection.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};

use crate::config::{PROTOCOL_SUBVERSION, PROTOCOL_VERSION};
use crate::error::{ProtocolError, Result};

pub const CLIENT_HANDSHAKE_LEN: usize = 12;
pub const SERVER_HANDSHAKE_LEN: usize = 8;

/// Protocol identifier opening both handshake messages
pub const PROTOCOL_ID: [u8; 4] = *b"TRTP";

/// Sub-protocol announced by clients
pub const SUB_PROTOCOL_ID: [u8; 4] = *b"HOTL";

/// Client half of the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHandshake {
    pub sub_protocol: [u8; 4],
    pub version: u16,
    pub sub_version: u16,
}

impl Default for ClientHandshake {
    fn default() -> Self {
        Self {
            sub_protocol: SUB_PROTOCOL_ID,
            version: PROTOCOL_VERSION,
            sub_version: PROTOCOL_SUBVERSION,
        }
    }
}

impl ClientHandshake {
    pub fn to_bytes(&self) -> [u8; CLIENT_HANDSHAKE_LEN] {
        let parts: [&[u8]; 4] = [
            &PROTOCOL_ID,
            &self.sub_protocol,
            &self.version.to_be_bytes(),
            &self.sub_version.to_be_bytes(),
        ];
        let mut out = [0u8; CLIENT_HANDSHAKE_LEN];
        out.copy_from_slice(&parts.concat());
        out
    }

    pub fn from_bytes(bytes: &[u8; CLIENT_HANDSHAKE_LEN]) -> Result<Self> {
        if bytes[..4] != PROTOCOL_ID {
            return Err(ProtocolError::InvalidHandshake);
        }
        Ok(Self {
            sub_protocol: [bytes[4], bytes[5], bytes[6], bytes[7]],
            version: u16::from_be_bytes([bytes[8], bytes[9]]),
            sub_version: u16::from_be_bytes([bytes[10], bytes[11]]),
        })
    }
}

/// Server half of the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerHandshake {
    pub error_code: u32,
}

impl ServerHandshake {
    pub fn to_bytes(&self) -> [u8; SERVER_HANDSHAKE_LEN] {
        let [a, b, c, d] = self.error_code.to_be_bytes();
        let [p, r, o, t] = PROTOCOL_ID;
        [p, r, o, t, a, b, c, d]
    }

    pub fn from_bytes(bytes: &[u8; SERVER_HANDSHAKE_LEN]) -> Result<Self> {
        if bytes[..4] != PROTOCOL_ID {
            return Err(ProtocolError::InvalidHandshake);
        }
        Ok(Self {
            error_code: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// Perform the client side of the handshake on a freshly connected stream
#[instrument(skip(stream))]
pub async fn client_handshake<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&ClientHandshake::default().to_bytes()).await?;
    stream.flush().await?;

    let mut reply = [0u8; SERVER_HANDSHAKE_LEN];
    stream.read_exact(&mut reply).await?;
    let reply = ServerHandshake::from_bytes(&reply)?;

    if reply.error_code != 0 {
        warn!(error_code = reply.error_code, "Server rejected handshake");
        return Err(ProtocolError::HandshakeRejected(reply.error_code));
    }
    debug!("Handshake complete");
    Ok(())
}

/// Perform the server side: read the client announcement and accept it.
///
/// Clients announcing a sub-protocol other than `HOTL` are refused with
/// error code 1.
#[instrument(skip(stream))]
pub async fn server_handshake<S>(stream: &mut S) -> Result<ClientHandshake>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut hello = [0u8; CLIENT_HANDSHAKE_LEN];
    stream.read_exact(&mut hello).await?;
    let hello = ClientHandshake::from_bytes(&hello)?;

    let accepted = hello.sub_protocol == SUB_PROTOCOL_ID;
    let reply = ServerHandshake {
        error_code: u32::from(!accepted),
    };
    stream.write_all(&reply.to_bytes()).await?;
    stream.flush().await?;

    if !accepted {
        warn!(sub_protocol = ?hello.sub_protocol, "Refusing unknown sub-protocol");
        return Err(ProtocolError::InvalidHandshake);
    }
    debug!(version = hello.version, sub_version = hello.sub_version, "Accepted client handshake");
    Ok(hello)
}
