// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use deku::DekuContainerRead;
use peek_common::{PeekError, Result};

use crate::resource_external_types::RES_CHUNK_HEADER_SIZE;

/// Header shared by every chunk in a compiled manifest or resource table.
///
/// `size` covers the header and all nested content, so `[start, end())` is
/// the whole chunk and `content_start()` is where a container chunk's
/// children begin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkHeader {
    pub chunk_type: u16,
    pub header_size: u16,
    pub size: u32,
    pub start: usize
}

impl ChunkHeader {
    pub fn end(&self) -> usize {
        self.start + self.size as usize
    }

    pub fn content_start(&self) -> usize {
        self.start + self.header_size as usize
    }
}

/// Cursor over a chunk-structured binary buffer.
///
/// Every read validates the remaining length before touching the slice;
/// chunk sizes and offsets come straight from untrusted package data.
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(PeekError::TruncatedInput {
                offset: self.pos,
                requested: n,
                available
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Move the cursor to an absolute offset. The end of the buffer itself
    /// is a valid position; anything past it is not.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(PeekError::OffsetOutOfRange {
                offset,
                len: self.data.len()
            });
        }
        self.pos = offset;
        Ok(())
    }

    /// Jump over whatever remains of the current chunk, usually to
    /// `ChunkHeader::end()`.
    pub fn skip_to(&mut self, offset: usize) -> Result<()> {
        self.seek(offset)
    }

    pub fn read_chunk_header(&mut self) -> Result<ChunkHeader> {
        let start = self.pos;
        let chunk_type = self.read_u16()?;
        let header_size = self.read_u16()?;
        let size = self.read_u32()?;
        // A size smaller than the header, or a header larger than the
        // chunk, would stall or misdirect the sequential walk.
        if size < RES_CHUNK_HEADER_SIZE || u32::from(header_size) > size {
            return Err(PeekError::MalformedChunk {
                chunk_type,
                offset: start
            });
        }
        Ok(ChunkHeader {
            chunk_type,
            header_size,
            size,
            start
        })
    }

    /// Decode a fixed-layout structure at the cursor via its deku
    /// definition, advancing past the bytes it consumed.
    pub fn read_struct<T>(&mut self) -> Result<T>
    where
        T: for<'b> DekuContainerRead<'b>
    {
        let remaining = &self.data[self.pos..];
        let ((rest, _), value) = T::from_bytes((remaining, 0))?;
        self.pos += remaining.len() - rest.len();
        Ok(value)
    }
}
