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

use std::{io, rc::Rc};

use deku::prelude::*;
use zip::result::ZipError;

/// Common error type making it easier to share `Result`s between PEEK crates.
///
/// In general designed to avoid needing utilities like `map_err`.
#[derive(Debug, Clone)]
pub enum PeekError {
    /// A read requested more bytes than remain in the input buffer. The
    /// compiled manifest and resource table are length-prefixed throughout,
    /// so this means the buffer was cut short or a declared length lies.
    TruncatedInput {
        offset: usize,
        requested: usize,
        available: usize
    },
    /// A seek targeted an offset past the end of the input buffer. Chunk
    /// sizes and string offsets come from untrusted package data, so every
    /// absolute jump is validated before the cursor moves.
    OffsetOutOfRange { offset: usize, len: usize },
    /// A chunk header declared an impossible shape (total size smaller than
    /// the 8-byte header, or a header size larger than the whole chunk).
    /// Such a chunk cannot be traversed safely.
    MalformedChunk { chunk_type: u16, offset: usize },
    /// A string pool's header, offset table or string data is internally
    /// inconsistent with the buffer that contains it.
    MalformedStringPool(String),
    /// A string was requested by an index at or past the pool's declared
    /// string count.
    StringPoolIndexOutOfRange { index: u32, string_count: u32 },
    /// The compiled manifest was walked to the end without finding an
    /// `icon` attribute holding a resource reference on the `application`
    /// element inside `manifest`.
    IconReferenceNotFound,
    /// The resource table contained no configuration in which the icon
    /// reference resolves to a plain string path.
    IconPathNotFound,
    /// A named entry was missing from the package archive. Paths declared
    /// by the resource table are expected to exist; a missing one indicates
    /// a corrupt or hostile package.
    EntryNotFound(String),
    /// An error occurred while reading the package file from disk.
    FileIoError(Rc<io::Error>),
    /// The package archive itself could not be parsed as a zip file. See
    /// [ZipError].
    ArchiveReadFailed(Rc<ZipError>),
    /// A candidate icon entry's bytes could not be decoded as a raster
    /// image. See [image::ImageError].
    ImageDecodingFailed(Rc<image::ImageError>),
    /// Every candidate path was read and decoded, but none produced an
    /// image with a non-zero pixel area.
    NoIconProduced,
    /// A fixed-layout structure failed to parse from the buffer. See
    /// [DekuError].
    ByteParsingFailed(DekuError)
}

/// Result type where the error is always [PeekError].
pub type Result<T> = std::result::Result<T, PeekError>;

/// This makes it easier for Result<Something, PeekError> to be returned across FFI-ish boundaries
impl From<PeekError> for String {
    fn from(value: PeekError) -> Self {
        format!("{:?}", value)
    }
}

// Automatic conversion from other types of error to PeekError makes the rest of the code cleaner
impl From<io::Error> for PeekError {
    fn from(value: io::Error) -> Self {
        PeekError::FileIoError(value.into())
    }
}

impl From<ZipError> for PeekError {
    fn from(value: ZipError) -> Self {
        PeekError::ArchiveReadFailed(value.into())
    }
}

impl From<image::ImageError> for PeekError {
    fn from(value: image::ImageError) -> Self {
        PeekError::ImageDecodingFailed(value.into())
    }
}

impl From<DekuError> for PeekError {
    fn from(value: DekuError) -> Self {
        PeekError::ByteParsingFailed(value)
    }
}
