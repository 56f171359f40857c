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

use peek_common::{PeekError, Result};

use crate::chunk_reader::ChunkReader;
use crate::resource_external_types::{
    StringPoolHeader, RES_CHUNK_HEADER_SIZE, STRING_POOL_UTF8_FLAG
};

/// Handle to one string-pool chunk inside a larger buffer.
///
/// Opening the handle reads only the pool header and the per-index offset
/// table; strings themselves are decoded lazily by index. Lookups are
/// side-effect-free with respect to the caller's cursor: callers interleave
/// pool reads with their own chunk traversal, so every public method here
/// restores the cursor position it was handed.
#[derive(Debug)]
pub struct StringPool {
    chunk_start: usize,
    strings_start: u32,
    flags: u32,
    string_count: u32,
    offsets: Vec<u32>
}

impl StringPool {
    pub fn open(reader: &mut ChunkReader, chunk_start: usize) -> Result<Self> {
        let saved = reader.position();
        let result = Self::read_pool(reader, chunk_start);
        reader.seek(saved)?;
        result
    }

    fn read_pool(reader: &mut ChunkReader, chunk_start: usize) -> Result<Self> {
        reader
            .seek(chunk_start + RES_CHUNK_HEADER_SIZE as usize)
            .map_err(|e| malformed("pool header out of bounds", e))?;
        let header: StringPoolHeader = reader
            .read_struct()
            .map_err(|e| malformed("pool header truncated", e))?;

        // The offset table must fit in what remains of the buffer before
        // a single element is read, so a hostile string_count cannot
        // trigger an oversized allocation.
        let table_bytes = header.string_count as usize * 4;
        if reader.position() + table_bytes > reader.len() {
            return Err(PeekError::MalformedStringPool(format!(
                "offset table of {} strings overruns the buffer",
                header.string_count
            )));
        }

        let mut offsets = Vec::with_capacity(header.string_count as usize);
        for _ in 0..header.string_count {
            offsets.push(
                reader
                    .read_u32()
                    .map_err(|e| malformed("offset table truncated", e))?
            );
        }

        Ok(Self {
            chunk_start,
            strings_start: header.strings_start,
            flags: header.flags,
            string_count: header.string_count,
            offsets
        })
    }

    pub fn string_count(&self) -> u32 {
        self.string_count
    }

    /// String pool is encoded in UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.flags & STRING_POOL_UTF8_FLAG != 0
    }

    /// Decode the string at `index` per the pool's encoding flag.
    pub fn string_at(&self, reader: &mut ChunkReader, index: u32) -> Result<String> {
        let saved = reader.position();
        let result = self.decode_string(reader, index);
        reader.seek(saved)?;
        result
    }

    /// Read only the length prefix of the string at `index` (its character
    /// count), without decoding the data. The manifest scan uses this to
    /// pass over strings that cannot match any of its target tokens.
    pub fn declared_length(&self, reader: &mut ChunkReader, index: u32) -> Result<usize> {
        let saved = reader.position();
        let result = self
            .seek_to_string(reader, index)
            .and_then(|_| self.read_length_prefix(reader));
        reader.seek(saved)?;
        result
    }

    fn seek_to_string(&self, reader: &mut ChunkReader, index: u32) -> Result<()> {
        if index >= self.string_count {
            return Err(PeekError::StringPoolIndexOutOfRange {
                index,
                string_count: self.string_count
            });
        }
        let offset = self.offsets[index as usize] as usize;
        reader
            .seek(self.chunk_start + self.strings_start as usize + offset)
            .map_err(|e| malformed("string offset out of bounds", e))
    }

    // Length prefixes are one code unit, or two when the high bit of the
    // first is set (lengths >= 0x80 for UTF-8 pools, >= 0x8000 for UTF-16).
    fn read_length_prefix(&self, reader: &mut ChunkReader) -> Result<usize> {
        if self.is_utf8() {
            let first = reader
                .read_u8()
                .map_err(|e| malformed("length prefix truncated", e))?;
            if first & 0x80 != 0 {
                let low = reader
                    .read_u8()
                    .map_err(|e| malformed("length prefix truncated", e))?;
                Ok((((first & 0x7F) as usize) << 8) | low as usize)
            } else {
                Ok(first as usize)
            }
        } else {
            let first = reader
                .read_u16()
                .map_err(|e| malformed("length prefix truncated", e))?;
            if first & 0x8000 != 0 {
                let low = reader
                    .read_u16()
                    .map_err(|e| malformed("length prefix truncated", e))?;
                Ok((((first & 0x7FFF) as usize) << 16) | low as usize)
            } else {
                Ok(first as usize)
            }
        }
    }

    fn decode_string(&self, reader: &mut ChunkReader, index: u32) -> Result<String> {
        self.seek_to_string(reader, index)?;

        if self.is_utf8() {
            // UTF-8 strings carry two prefixes: the UTF-16 equivalent
            // character count, then the byte length of the data itself.
            let _char_count = self.read_length_prefix(reader)?;
            let byte_count = self.read_length_prefix(reader)?;
            let bytes = reader
                .read_bytes(byte_count)
                .map_err(|e| malformed("string data runs past the buffer", e))?;
            String::from_utf8(bytes.to_vec())
                .map_err(|_| PeekError::MalformedStringPool(format!("string {} is not valid UTF-8", index)))
        } else {
            let unit_count = self.read_length_prefix(reader)?;
            let bytes = reader
                .read_bytes(unit_count * 2)
                .map_err(|e| malformed("string data runs past the buffer", e))?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|_| PeekError::MalformedStringPool(format!("string {} is not valid UTF-16", index)))
        }
    }
}

fn malformed(what: &str, source: PeekError) -> PeekError {
    PeekError::MalformedStringPool(format!("{}: {:?}", what, source))
}
