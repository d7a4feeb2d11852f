//! Bolt messages and chunked framing.
//!
//! # Framing
//! ```text
//! message bytes → [u16 len][chunk] [u16 len][chunk] ... [0x00 0x00]
//! ```
//! Chunks carry at most 65535 bytes; a zero-length chunk ends the message.
//! A zero-length chunk outside a message is a keep-alive NOOP.

use bytes::{BufMut, Bytes, BytesMut};

use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::packstream::{self, write_map_header, write_string, write_struct_header};
use crate::bolt::value::{BoltMap, BoltValue};

pub const MAX_CHUNK: usize = u16::MAX as usize;

/// Message signatures.
pub mod signature {
    pub const HELLO: u8 = 0x01;
    pub const GOODBYE: u8 = 0x02;
    pub const RESET: u8 = 0x0F;
    pub const RUN: u8 = 0x10;
    pub const PULL: u8 = 0x3F;
    pub const SUCCESS: u8 = 0x70;
    pub const RECORD: u8 = 0x71;
    pub const IGNORED: u8 = 0x7E;
    pub const FAILURE: u8 = 0x7F;
}

/// Client → server messages.
#[derive(Debug)]
pub enum Request<'a> {
    Hello {
        user_agent: &'a str,
        principal: &'a str,
        credentials: &'a str,
    },
    Run {
        query: &'a str,
        params: &'a BoltMap,
        database: Option<&'a str>,
    },
    /// `n = -1` pulls every remaining record.
    Pull { n: i64 },
    Reset,
    Goodbye,
}

impl Request<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Hello { .. } => "HELLO",
            Request::Run { .. } => "RUN",
            Request::Pull { .. } => "PULL",
            Request::Reset => "RESET",
            Request::Goodbye => "GOODBYE",
        }
    }

    /// Encode the message body (without chunking).
    pub fn encode(&self, buf: &mut BytesMut) -> BoltResult<()> {
        match self {
            Request::Hello {
                user_agent,
                principal,
                credentials,
            } => {
                write_struct_header(signature::HELLO, 1, buf)?;
                write_map_header(4, buf)?;
                write_entry("user_agent", user_agent, buf)?;
                write_entry("scheme", "basic", buf)?;
                write_entry("principal", principal, buf)?;
                write_entry("credentials", credentials, buf)?;
            }
            Request::Run {
                query,
                params,
                database,
            } => {
                write_struct_header(signature::RUN, 3, buf)?;
                write_string(query, buf)?;
                write_map_header(params.len(), buf)?;
                for (key, value) in params.iter() {
                    write_string(key, buf)?;
                    packstream::encode(value, buf).map_err(|e| {
                        BoltError::Protocol(format!("parameter '{}': {}", key, e))
                    })?;
                }
                match database {
                    Some(db) => {
                        write_map_header(1, buf)?;
                        write_entry("db", db, buf)?;
                    }
                    None => write_map_header(0, buf)?,
                }
            }
            Request::Pull { n } => {
                write_struct_header(signature::PULL, 1, buf)?;
                write_map_header(1, buf)?;
                write_string("n", buf)?;
                packstream::write_int(*n, buf);
            }
            Request::Reset => write_struct_header(signature::RESET, 0, buf)?,
            Request::Goodbye => write_struct_header(signature::GOODBYE, 0, buf)?,
        }
        Ok(())
    }
}

fn write_entry(key: &str, value: &str, buf: &mut BytesMut) -> BoltResult<()> {
    write_string(key, buf)?;
    write_string(value, buf)?;
    Ok(())
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(BoltMap),
    Record(Vec<BoltValue>),
    Ignored,
    Failure { code: String, message: String },
}

impl Response {
    /// Decode a complete (de-chunked) message.
    pub fn decode(mut raw: Bytes) -> BoltResult<Self> {
        let (fields, tag) = packstream::read_struct_header(&mut raw)?;
        let mut values = Vec::with_capacity(fields);
        for _ in 0..fields {
            values.push(packstream::decode(&mut raw)?);
        }

        let response = match (tag, values.as_mut_slice()) {
            (signature::SUCCESS, [BoltValue::Map(meta)]) => Response::Success(std::mem::take(meta)),
            (signature::RECORD, [BoltValue::List(items)]) => Response::Record(std::mem::take(items)),
            (signature::IGNORED, []) => Response::Ignored,
            (signature::FAILURE, [BoltValue::Map(meta)]) => Response::Failure {
                code: meta
                    .get("code")
                    .and_then(BoltValue::as_str)
                    .unwrap_or("Neo.DatabaseError.General.UnknownError")
                    .to_string(),
                message: meta
                    .get("message")
                    .and_then(BoltValue::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => {
                return Err(BoltError::Protocol(format!(
                    "unexpected message 0x{:02X} with {} fields",
                    tag, fields
                )))
            }
        };
        Ok(response)
    }

    /// Encode the message body. The client never sends these; test
    /// servers use it to script replies.
    pub fn encode(&self, buf: &mut BytesMut) -> BoltResult<()> {
        match self {
            Response::Success(meta) => {
                write_struct_header(signature::SUCCESS, 1, buf)?;
                packstream::encode(&BoltValue::Map(meta.clone()), buf)?;
            }
            Response::Record(values) => {
                write_struct_header(signature::RECORD, 1, buf)?;
                packstream::encode(&BoltValue::List(values.clone()), buf)?;
            }
            Response::Ignored => write_struct_header(signature::IGNORED, 0, buf)?,
            Response::Failure { code, message } => {
                write_struct_header(signature::FAILURE, 1, buf)?;
                write_map_header(2, buf)?;
                write_entry("code", code, buf)?;
                write_entry("message", message, buf)?;
            }
        }
        Ok(())
    }
}

/// Split an encoded message into chunks and append the terminator.
pub fn chunk(message: &[u8], out: &mut BytesMut) {
    for piece in message.chunks(MAX_CHUNK) {
        out.put_u16(piece.len() as u16);
        out.put_slice(piece);
    }
    out.put_u16(0);
}
