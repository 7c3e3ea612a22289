//! Blob streams: the sequential auxiliary-data records the binder embeds in an image.
//!
//! Each record is a 12-byte little-endian [`BlobHeader`] followed by `size` bytes of
//! payload. `size` is always a multiple of four and ids are unique within a stream.
use crate::error::BlobError;
use std::{collections::HashSet, mem::size_of};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlobHeader {
    pub flags: u32,
    pub id: u32,
    pub size: u32,
}

const _: () = assert!(size_of::<BlobHeader>() == BlobHeader::SIZE);

impl BlobHeader {
    pub const SIZE: usize = 12;

    pub fn new(flags: u32, id: u32, size: u32) -> Self {
        Self { flags, id, size }
    }

    pub fn is_aligned(&self) -> bool {
        self.size % 4 == 0
    }

    fn read(bytes: &[u8]) -> Self {
        let word =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            flags: word(0),
            id: word(4),
            size: word(8),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Blob<'a> {
    pub header: BlobHeader,
    pub payload: &'a [u8],
}

impl Blob<'_> {
    pub fn id(&self) -> u32 {
        self.header.id
    }

    pub fn flags(&self) -> u32 {
        self.header.flags
    }
}

/// Reads records front to back. Iteration stops after the first error.
#[derive(Clone, Debug)]
pub struct BlobStream<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> BlobStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            failed: false,
        }
    }

    /// Byte offset of the next header.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Reads one header and its payload, or `None` once the stream is consumed.
    pub fn read_next(&mut self) -> Option<Result<Blob<'a>, BlobError>> {
        if self.failed || self.is_exhausted() {
            return None;
        }
        let result = self.read_record();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn read_record(&mut self) -> Result<Blob<'a>, BlobError> {
        let offset = self.offset;
        let rest = &self.bytes[offset..];
        if rest.len() < BlobHeader::SIZE {
            return Err(BlobError::TruncatedHeader { offset });
        }
        let header = BlobHeader::read(rest);
        if !header.is_aligned() {
            return Err(BlobError::Misaligned {
                id: header.id,
                size: header.size,
            });
        }
        let available = rest.len() - BlobHeader::SIZE;
        let size = header.size as usize;
        if size > available {
            return Err(BlobError::TruncatedPayload {
                id: header.id,
                offset,
                size: header.size,
                available,
            });
        }
        let start = BlobHeader::SIZE;
        let payload = &rest[start..start + size];
        self.offset += BlobHeader::SIZE + size;
        tracing::trace!(
            "blob {} (flags {:#x}) at offset {:#x}, {} bytes",
            header.id,
            header.flags,
            offset,
            size
        );
        Ok(Blob { header, payload })
    }

    /// Linear scan from the start of the stream for `id`.
    pub fn find(&self, id: u32) -> Result<Option<Blob<'a>>, BlobError> {
        for blob in BlobStream::new(self.bytes) {
            let blob = blob?;
            if blob.id() == id {
                return Ok(Some(blob));
            }
        }
        Ok(None)
    }
}

impl<'a> Iterator for BlobStream<'a> {
    type Item = Result<Blob<'a>, BlobError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next()
    }
}

/// Emits a blob stream, enforcing unique ids and DWORD-sized payloads.
#[derive(Clone, Debug, Default)]
pub struct BlobStreamWriter {
    bytes: Vec<u8>,
    ids: HashSet<u32>,
}

impl BlobStreamWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn push(&mut self, id: u32, flags: u32, payload: &[u8]) -> Result<&mut Self, BlobError> {
        let size = u32::try_from(payload.len()).map_err(|_| BlobError::TooLarge {
            id,
            len: payload.len(),
        })?;
        if size % 4 != 0 {
            return Err(BlobError::Misaligned { id, size });
        }
        if !self.ids.insert(id) {
            return Err(BlobError::DuplicateId(id));
        }
        BlobHeader::new(flags, id, size).write(&mut self.bytes);
        self.bytes.extend_from_slice(payload);
        Ok(self)
    }

    /// Like [`push`](Self::push), zero-padding the payload up to a DWORD.
    pub fn push_padded(
        &mut self,
        id: u32,
        flags: u32,
        payload: &[u8],
    ) -> Result<&mut Self, BlobError> {
        let mut padded = payload.to_vec();
        padded.resize(payload.len().next_multiple_of(4), 0);
        self.push(id, flags, &padded)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
