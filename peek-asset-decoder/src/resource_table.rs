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

use log::{debug, warn};
use peek_common::{PeekError, Result};

use crate::chunk_reader::{ChunkHeader, ChunkReader};
use crate::resource_external_types::{
    ResValueChunk, TableEntryHeader, TableHeaderChunk, TableTypeHeader, CHUNK_STRING_POOL,
    CHUNK_TABLE, CHUNK_TABLE_PACKAGE, CHUNK_TABLE_TYPE, DATA_TYPE_STRING, ENTRY_FLAG_COMPLEX,
    UINT32_MINUS_ONE
};
use crate::string_pool::StringPool;

/// Resolve a resource reference from the manifest against a compiled
/// `resources.arsc` buffer, returning every configuration's candidate file
/// path in chunk-encounter order.
///
/// The package byte of the reference is not matched against the package
/// chunk: resolution assumes the single application package. Unlike the
/// manifest walk, the table is always scanned to completion — each
/// per-configuration type block holding the entry contributes a path.
pub fn resolve_icon_paths(table: &[u8], reference: u32) -> Result<Vec<String>> {
    let res_type = ((reference >> 16) & 0xFF) as u8;
    let res_index = reference & 0xFFFF;

    let mut reader = ChunkReader::new(table);
    let mut global_pool: Option<StringPool> = None;
    let mut paths: Vec<String> = Vec::new();

    while !reader.at_end() {
        let chunk = reader.read_chunk_header()?;
        match chunk.chunk_type {
            // The table chunk wraps the global pool and the packages, and
            // a package wraps its type blocks. Both are entered through
            // their declared header size: package headers legitimately
            // grew by a field across format revisions.
            CHUNK_TABLE => {
                let header: TableHeaderChunk = reader.read_struct()?;
                debug!("resource table declares {} package(s)", header.package_count);
                reader.seek(chunk.content_start())?;
                continue;
            }
            CHUNK_TABLE_PACKAGE => {
                reader.seek(chunk.content_start())?;
                continue;
            }
            CHUNK_STRING_POOL => {
                // The first pool is the table's global value pool; the
                // type and key pools inside packages hold symbol names,
                // not file paths.
                if global_pool.is_none() {
                    global_pool = Some(StringPool::open(&mut reader, chunk.start)?);
                }
            }
            CHUNK_TABLE_TYPE => {
                if let Some(path) =
                    resolve_type_block(&mut reader, &chunk, res_type, res_index, global_pool.as_ref())?
                {
                    paths.push(path);
                }
            }
            // Type specs and unknown chunk types hold nothing resolvable.
            _ => {}
        }
        reader.skip_to(chunk.end())?;
    }

    if paths.is_empty() {
        return Err(PeekError::IconPathNotFound);
    }
    Ok(paths)
}

// One type block is one (type id, configuration) pair. It yields a path
// when its id matches, it contains the entry index, the entry is present
// in this configuration, and the entry's value is a plain string.
fn resolve_type_block(
    reader: &mut ChunkReader,
    chunk: &ChunkHeader,
    res_type: u8,
    res_index: u32,
    global_pool: Option<&StringPool>
) -> Result<Option<String>> {
    let header: TableTypeHeader = reader.read_struct()?;
    if header.id != res_type {
        return Ok(None);
    }

    // The configuration descriptor declares its own size.
    let config_size = reader.read_u32()?;
    if config_size < 4 {
        return Err(PeekError::MalformedChunk {
            chunk_type: chunk.chunk_type,
            offset: chunk.start
        });
    }
    reader.read_bytes(config_size as usize - 4)?;

    if res_index >= header.entry_count {
        return Ok(None);
    }

    // The entry-offset table follows the configuration directly.
    let offset_table = reader.position();
    reader.seek(offset_table + res_index as usize * 4)?;
    let entry_offset = reader.read_u32()?;
    if entry_offset == UINT32_MINUS_ONE {
        // Entry absent in this configuration.
        return Ok(None);
    }

    reader.seek(chunk.start + header.entries_start as usize + entry_offset as usize)?;
    let entry: TableEntryHeader = reader.read_struct()?;
    if entry.flags & ENTRY_FLAG_COMPLEX != 0 {
        warn!(
            "icon entry {:#06x} in type {:#04x} is a complex value, not a file path",
            res_index, res_type
        );
        return Ok(None);
    }

    let value: ResValueChunk = reader.read_struct()?;
    if value.data_type != DATA_TYPE_STRING {
        warn!(
            "icon entry {:#06x} in type {:#04x} has non-string value type {:#04x}",
            res_index, res_type, value.data_type
        );
        return Ok(None);
    }

    let pool = global_pool.ok_or_else(|| {
        PeekError::MalformedStringPool("resource table entry precedes the global string pool".into())
    })?;
    let path = pool.string_at(reader, value.data)?;
    Ok(Some(path))
}
