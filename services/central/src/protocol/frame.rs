use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::message::{DATA_FORMAT_XML, MessageId};

/// Header size: four big-endian u32 fields.
pub const HEADER_LEN: usize = 16;

/// Largest body the link will accept: 20 MiB.
pub const MAX_BODY_LENGTH: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub message_id: u32,
    pub data_format: u32,
    pub magic: u32,
    pub data_length: u32,
}

impl FrameHeader {
    fn decode(bytes: &[u8]) -> Self {
        let field = |i: usize| {
            u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
        };
        Self {
            message_id: field(0),
            data_format: field(4),
            magic: field(8),
            data_length: field(12),
        }
    }
}

/// One complete message off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub body: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),
    #[error("oversize body of {0} bytes")]
    OversizeBody(u32),
}

/// Incremental deframer holding at most one partial frame.
///
/// A framing error (bad magic, oversize length) discards the entire buffer;
/// framing resumes from the next bytes fed in. No resynchronisation by
/// scanning is attempted.
pub struct Deframer {
    buf: BytesMut,
    magic: u32,
    max_body: usize,
}

impl Deframer {
    pub fn new(magic: u32) -> Self {
        Self::with_max_body(magic, MAX_BODY_LENGTH)
    }

    pub fn with_max_body(magic: u32, max_body: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            magic,
            max_body,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame, if the buffer holds one.
    ///
    /// Zero-length bodies are legal and emitted as soon as their header is
    /// complete.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FramingError> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }
        let header = FrameHeader::decode(&self.buf[..HEADER_LEN]);
        if header.magic != self.magic {
            self.buf.clear();
            return Err(FramingError::BadMagic(header.magic));
        }
        if header.data_length as usize > self.max_body {
            self.buf.clear();
            return Err(FramingError::OversizeBody(header.data_length));
        }

        let total = HEADER_LEN + header.data_length as usize;
        if self.buf.len() < total {
            return Ok(None);
        }
        let mut frame = self.buf.split_to(total);
        frame.advance(HEADER_LEN);
        Ok(Some(Frame {
            header,
            body: frame.freeze(),
        }))
    }
}

/// Encode one message as `header || body`.
pub fn encode_frame(message_id: MessageId, magic: u32, body: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    out.put_u32(message_id.as_u32());
    out.put_u32(DATA_FORMAT_XML);
    out.put_u32(magic);
    out.put_u32(body.len() as u32);
    out.put_slice(body);
    out.freeze()
}
