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

// Types that Android/APKs themselves use to describe resources
use deku::prelude::*;

pub const RES_CHUNK_HEADER_SIZE: u32 = 8;
pub const UINT32_MINUS_ONE: u32 = 0xFFFFFFFF;
// Either a string index or UINT32_MINUS_ONE if empty
pub type ResStringPoolRef = u32;

// Chunk type tags. A decoder has to skip chunk types it does not know, so
// these stay raw u16 constants rather than a closed enum.
pub const CHUNK_NULL: u16 = 0x0000;
pub const CHUNK_STRING_POOL: u16 = 0x0001;
pub const CHUNK_TABLE: u16 = 0x0002;
pub const CHUNK_XML_FILE: u16 = 0x0003;

// Types within an XmlFile
pub const CHUNK_XML_START_NAMESPACE: u16 = 0x0100;
pub const CHUNK_XML_END_NAMESPACE: u16 = 0x0101;
pub const CHUNK_XML_START_ELEMENT: u16 = 0x0102;
pub const CHUNK_XML_END_ELEMENT: u16 = 0x0103;
pub const CHUNK_XML_RESOURCE_MAP: u16 = 0x0180;

// Types within a Table
pub const CHUNK_TABLE_PACKAGE: u16 = 0x0200;
pub const CHUNK_TABLE_TYPE: u16 = 0x0201;
pub const CHUNK_TABLE_TYPE_SPEC: u16 = 0x0202;

pub const STRING_POOL_UTF8_FLAG: u32 = 1 << 8;

// Typed-value data types. Others exist but are not resolvable to a file path.
pub const DATA_TYPE_REFERENCE: u8 = 0x01;
pub const DATA_TYPE_STRING: u8 = 0x03;

// A table entry with this flag holds a map of values instead of one ResValue.
pub const ENTRY_FLAG_COMPLEX: u16 = 0x0001;

#[derive(Debug, PartialEq, DekuRead)]
pub struct XmlNodeHeader {
    // Where this node appeared in the original document
    // Not important here, only debugging and logs
    pub line_number: u32,
    // The XML comment that originally appeared above this node
    pub comment: ResStringPoolRef
}

#[derive(Debug, PartialEq, DekuRead)]
pub struct XmlStartElementChunk {
    pub namespace: ResStringPoolRef,
    pub name: ResStringPoolRef,
    pub attribute_start: u16,
    pub attribute_size: u16,
    pub attribute_count: u16,
    // Index (1-based) of the "id" attribute, 0 if none
    pub id_index: u16,
    // Index (1-based) of the "class" attribute, 0 if none
    pub class_index: u16,
    // Index (1-based) of the "style" attribute, 0 if none
    pub style_index: u16
}

#[derive(Debug, PartialEq, DekuRead)]
pub struct XmlEndElementChunk {
    pub namespace: ResStringPoolRef,
    pub name: ResStringPoolRef
}

#[derive(Debug, PartialEq, DekuRead)]
pub struct XmlAttributeChunk {
    pub namespace: ResStringPoolRef,
    pub name: ResStringPoolRef,
    // The attribute value as a plain pool string, or UINT32_MINUS_ONE when
    // only the typed value carries it
    pub raw_value: ResStringPoolRef,
    pub typed_value: ResValueChunk
}

// The typed value shared by XML attributes and table entries
#[derive(Debug, PartialEq, DekuRead)]
pub struct ResValueChunk {
    pub size: u16,
    pub res0: u8,
    pub data_type: u8,
    pub data: u32
}

#[derive(Debug, PartialEq, DekuRead)]
pub struct StringPoolHeader {
    pub string_count: u32,
    pub style_count: u32,
    pub flags: u32,
    pub strings_start: u32,
    pub styles_start: u32
}

#[derive(Debug, PartialEq, DekuRead)]
pub struct TableHeaderChunk {
    pub package_count: u32
}

// Fixed-size front of a TableType chunk header. The configuration
// descriptor that follows declares its own size and is skipped by it.
#[derive(Debug, PartialEq, DekuRead)]
pub struct TableTypeHeader {
    pub id: u8,
    pub flags: u8,
    // Must be 0
    pub reserved: u16,
    pub entry_count: u32,
    pub entries_start: u32
}

#[derive(Debug, PartialEq, DekuRead)]
pub struct TableEntryHeader {
    pub size: u16,
    pub flags: u16,
    pub key: ResStringPoolRef
}
