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

//! Builders assembling synthetic AXML / ARSC chunk buffers, byte for byte,
//! so the decoder tests control every field the parsers look at.

#![allow(dead_code)]

use peek_asset_decoder::resource_external_types::*;

pub fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Wrap `body` in a chunk whose header is the 8 fixed bytes plus
/// `header_extra`.
pub fn chunk(chunk_type: u16, header_extra: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, chunk_type);
    push_u16(&mut out, (8 + header_extra.len()) as u16);
    push_u32(&mut out, (8 + header_extra.len() + body.len()) as u32);
    out.extend_from_slice(header_extra);
    out.extend_from_slice(body);
    out
}

fn pool_chunk(strings_len: usize, flags: u32, offsets: &[u32], data: &[u8]) -> Vec<u8> {
    let mut header_extra = Vec::new();
    push_u32(&mut header_extra, strings_len as u32);
    push_u32(&mut header_extra, 0); // style_count
    push_u32(&mut header_extra, flags);
    // Offsets are relative to strings_start, which is relative to the
    // chunk start and sits past the header and the offset table.
    push_u32(&mut header_extra, (28 + 4 * strings_len) as u32);
    push_u32(&mut header_extra, 0); // styles_start

    let mut body = Vec::new();
    for offset in offsets {
        push_u32(&mut body, *offset);
    }
    body.extend_from_slice(data);
    chunk(CHUNK_STRING_POOL, &header_extra, &body)
}

/// A UTF-16 string pool chunk, one entry per input string, in order.
pub fn utf16_pool(strings: &[&str]) -> Vec<u8> {
    let mut offsets = Vec::new();
    let mut data = Vec::new();
    for s in strings {
        offsets.push(data.len() as u32);
        let units: Vec<u16> = s.encode_utf16().collect();
        if units.len() >= 0x8000 {
            push_u16(&mut data, (0x8000 | (units.len() >> 16)) as u16);
            push_u16(&mut data, (units.len() & 0xFFFF) as u16);
        } else {
            push_u16(&mut data, units.len() as u16);
        }
        for unit in units {
            push_u16(&mut data, unit);
        }
        push_u16(&mut data, 0); // terminator
    }
    while data.len() % 4 != 0 {
        data.push(0);
    }
    pool_chunk(strings.len(), 0, &offsets, &data)
}

/// A UTF-8 string pool chunk with the two length prefixes (character
/// count, then byte count) each in their short or long form.
pub fn utf8_pool(strings: &[&str]) -> Vec<u8> {
    let mut offsets = Vec::new();
    let mut data = Vec::new();
    for s in strings {
        offsets.push(data.len() as u32);
        push_utf8_len(&mut data, s.encode_utf16().count());
        push_utf8_len(&mut data, s.len());
        data.extend_from_slice(s.as_bytes());
        data.push(0); // terminator
    }
    while data.len() % 4 != 0 {
        data.push(0);
    }
    pool_chunk(strings.len(), STRING_POOL_UTF8_FLAG, &offsets, &data)
}

fn push_utf8_len(buf: &mut Vec<u8>, len: usize) {
    if len >= 0x80 {
        buf.push(0x80 | ((len >> 8) & 0xFF) as u8);
        buf.push((len & 0xFF) as u8);
    } else {
        buf.push(len as u8);
    }
}

// line_number + comment, shared by every XML node chunk
fn node_extra() -> Vec<u8> {
    let mut extra = Vec::new();
    push_u32(&mut extra, 1);
    push_u32(&mut extra, UINT32_MINUS_ONE);
    extra
}

#[derive(Clone, Copy)]
pub struct TestAttribute {
    pub name: u32,
    pub raw_value: u32,
    pub data_type: u8,
    pub data: u32
}

impl TestAttribute {
    /// A resource-reference attribute, the shape `android:icon="@ref"`
    /// compiles to.
    pub fn reference(name: u32, reference: u32) -> Self {
        Self {
            name,
            raw_value: UINT32_MINUS_ONE,
            data_type: DATA_TYPE_REFERENCE,
            data: reference
        }
    }

    /// A plain string attribute whose value lives in the pool.
    pub fn string(name: u32, value_index: u32) -> Self {
        Self {
            name,
            raw_value: value_index,
            data_type: DATA_TYPE_STRING,
            data: value_index
        }
    }
}

pub fn start_element(name: u32, attributes: &[TestAttribute]) -> Vec<u8> {
    let mut body = Vec::new();
    push_u32(&mut body, UINT32_MINUS_ONE); // namespace
    push_u32(&mut body, name);
    push_u16(&mut body, 0x0014); // attribute_start
    push_u16(&mut body, 0x0014); // attribute_size
    push_u16(&mut body, attributes.len() as u16);
    push_u16(&mut body, 0); // id_index
    push_u16(&mut body, 0); // class_index
    push_u16(&mut body, 0); // style_index
    for attribute in attributes {
        push_u32(&mut body, UINT32_MINUS_ONE); // namespace
        push_u32(&mut body, attribute.name);
        push_u32(&mut body, attribute.raw_value);
        push_u16(&mut body, 8); // value size
        body.push(0); // res0
        body.push(attribute.data_type);
        push_u32(&mut body, attribute.data);
    }
    chunk(CHUNK_XML_START_ELEMENT, &node_extra(), &body)
}

pub fn end_element(name: u32) -> Vec<u8> {
    let mut body = Vec::new();
    push_u32(&mut body, UINT32_MINUS_ONE); // namespace
    push_u32(&mut body, name);
    chunk(CHUNK_XML_END_ELEMENT, &node_extra(), &body)
}

pub fn start_namespace(prefix: u32, uri: u32) -> Vec<u8> {
    let mut body = Vec::new();
    push_u32(&mut body, prefix);
    push_u32(&mut body, uri);
    chunk(CHUNK_XML_START_NAMESPACE, &node_extra(), &body)
}

pub fn end_namespace(prefix: u32, uri: u32) -> Vec<u8> {
    let mut body = Vec::new();
    push_u32(&mut body, prefix);
    push_u32(&mut body, uri);
    chunk(CHUNK_XML_END_NAMESPACE, &node_extra(), &body)
}

pub fn resource_map(ids: &[u32]) -> Vec<u8> {
    let mut body = Vec::new();
    for id in ids {
        push_u32(&mut body, *id);
    }
    chunk(CHUNK_XML_RESOURCE_MAP, &[], &body)
}

/// Wrap the concatenated child chunks in an XML document chunk.
pub fn xml_document(children: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = children.concat();
    chunk(CHUNK_XML_FILE, &[], &body)
}

/// Wrap the concatenated child chunks in a resource table chunk.
pub fn resource_table_document(children: &[Vec<u8>]) -> Vec<u8> {
    let mut header_extra = Vec::new();
    push_u32(&mut header_extra, 1); // package_count
    let body: Vec<u8> = children.concat();
    chunk(CHUNK_TABLE, &header_extra, &body)
}

/// A table package chunk. `extended` appends the `type_id_offset` field
/// that newer toolchains emit, growing the header from 284 to 288 bytes.
pub fn table_package(extended: bool, children: &[Vec<u8>]) -> Vec<u8> {
    let mut header_extra = Vec::new();
    push_u32(&mut header_extra, 0x7F); // package id
    header_extra.extend_from_slice(&[0u8; 256]); // package name, UTF-16
    push_u32(&mut header_extra, 0); // type_strings
    push_u32(&mut header_extra, 0); // last_public_type
    push_u32(&mut header_extra, 0); // key_strings
    push_u32(&mut header_extra, 0); // last_public_key
    if extended {
        push_u32(&mut header_extra, 0); // type_id_offset
    }
    let body: Vec<u8> = children.concat();
    chunk(CHUNK_TABLE_PACKAGE, &header_extra, &body)
}

pub fn table_type_spec(id: u8, entry_count: u32) -> Vec<u8> {
    let mut header_extra = Vec::new();
    header_extra.push(id);
    header_extra.push(0); // res0
    push_u16(&mut header_extra, 0); // types_count
    push_u32(&mut header_extra, entry_count);
    let mut body = Vec::new();
    for _ in 0..entry_count {
        push_u32(&mut body, 0); // configuration change flags
    }
    chunk(CHUNK_TABLE_TYPE_SPEC, &header_extra, &body)
}

/// A resource entry whose value is a string-pool index.
pub fn string_entry(pool_index: u32) -> Vec<u8> {
    typed_entry(0, DATA_TYPE_STRING, pool_index)
}

pub fn typed_entry(flags: u16, data_type: u8, data: u32) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, 8); // entry size
    push_u16(&mut out, flags);
    push_u32(&mut out, 0); // key
    push_u16(&mut out, 8); // value size
    out.push(0); // res0
    out.push(data_type);
    push_u32(&mut out, data);
    out
}

pub fn complex_entry() -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, 16); // entry size
    push_u16(&mut out, ENTRY_FLAG_COMPLEX);
    push_u32(&mut out, 0); // key
    // map header stand-in; never decoded
    push_u32(&mut out, 0);
    push_u32(&mut out, 0);
    out
}

/// A table type block for one (type id, configuration) pair, with
/// `entry_count` offset slots. `entries` places pre-built entry bytes at
/// specific indices; every other slot holds the absent sentinel.
pub fn table_type(id: u8, entry_count: u32, entries: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut offsets = vec![UINT32_MINUS_ONE; entry_count as usize];
    let mut entry_data = Vec::new();
    for (index, bytes) in entries {
        offsets[*index as usize] = entry_data.len() as u32;
        entry_data.extend_from_slice(bytes);
    }

    let header_len = 8 + 12 + 16; // chunk header, fixed fields, config
    let mut header_extra = Vec::new();
    header_extra.push(id);
    header_extra.push(0); // flags
    push_u16(&mut header_extra, 0); // reserved
    push_u32(&mut header_extra, entry_count);
    push_u32(&mut header_extra, header_len + 4 * entry_count); // entries_start
    push_u32(&mut header_extra, 16); // configuration size, self-declared
    header_extra.extend_from_slice(&[0u8; 12]); // default configuration

    let mut body = Vec::new();
    for offset in offsets {
        push_u32(&mut body, offset);
    }
    body.extend_from_slice(&entry_data);
    chunk(CHUNK_TABLE_TYPE, &header_extra, &body)
}
