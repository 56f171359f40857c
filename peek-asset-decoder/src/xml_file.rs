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

use log::trace;
use peek_common::{PeekError, Result};

use crate::chunk_reader::{ChunkHeader, ChunkReader};
use crate::resource_external_types::{
    XmlAttributeChunk, XmlEndElementChunk, XmlNodeHeader, XmlStartElementChunk,
    CHUNK_STRING_POOL, CHUNK_XML_END_ELEMENT, CHUNK_XML_FILE, CHUNK_XML_START_ELEMENT,
    DATA_TYPE_REFERENCE, UINT32_MINUS_ONE
};
use crate::string_pool::StringPool;

const MANIFEST_ELEMENT: &str = "manifest";
const APPLICATION_ELEMENT: &str = "application";
const ICON_ATTRIBUTE: &str = "icon";

// Chunks nest only by sequential layout, so containment has to be tracked
// across the walk: the application element only counts while the cursor is
// between the manifest start and end events.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Searching,
    InsideManifest
}

// Pool indices of the three tokens the walk matches against. An index stays
// None when the pool simply does not contain that token.
#[derive(Debug, Default)]
struct NameTokens {
    manifest: Option<u32>,
    application: Option<u32>,
    icon: Option<u32>
}

impl NameTokens {
    fn complete(&self) -> bool {
        self.manifest.is_some() && self.application.is_some() && self.icon.is_some()
    }
}

/// Walk a compiled `AndroidManifest.xml` buffer and return the resource
/// reference held by the `icon` attribute of the `application` element
/// inside `manifest`.
///
/// The first qualifying attribute wins. Exhausting the buffer without one
/// fails with [PeekError::IconReferenceNotFound].
pub fn find_icon_reference(manifest: &[u8]) -> Result<u32> {
    let mut reader = ChunkReader::new(manifest);
    let mut tokens: Option<NameTokens> = None;
    let mut scope = Scope::Searching;

    while !reader.at_end() {
        let chunk = reader.read_chunk_header()?;
        match chunk.chunk_type {
            // The document chunk wraps every other chunk; step into it
            // instead of over it.
            CHUNK_XML_FILE => {
                reader.seek(chunk.content_start())?;
                continue;
            }
            CHUNK_STRING_POOL => {
                // Only the first pool names elements and attributes.
                if tokens.is_none() {
                    tokens = Some(scan_name_tokens(&mut reader, &chunk)?);
                }
            }
            CHUNK_XML_START_ELEMENT => {
                if let Some(names) = tokens.as_ref() {
                    let _node: XmlNodeHeader = reader.read_struct()?;
                    let element: XmlStartElementChunk = reader.read_struct()?;
                    if Some(element.name) == names.manifest {
                        scope = Scope::InsideManifest;
                    }
                    if scope == Scope::InsideManifest && Some(element.name) == names.application {
                        if let Some(reference) = find_icon_attribute(&mut reader, &element, names)? {
                            return Ok(reference);
                        }
                    }
                }
            }
            CHUNK_XML_END_ELEMENT => {
                if let Some(names) = tokens.as_ref() {
                    let _node: XmlNodeHeader = reader.read_struct()?;
                    let element: XmlEndElementChunk = reader.read_struct()?;
                    if Some(element.name) == names.manifest {
                        scope = Scope::Searching;
                    }
                }
            }
            // Namespace events, the resource map and anything newer carry
            // nothing the icon lookup needs.
            _ => {}
        }
        reader.skip_to(chunk.end())?;
    }

    Err(PeekError::IconReferenceNotFound)
}

fn scan_name_tokens(reader: &mut ChunkReader, chunk: &ChunkHeader) -> Result<NameTokens> {
    let pool = StringPool::open(reader, chunk.start)?;
    let mut tokens = NameTokens::default();

    for index in 0..pool.string_count() {
        // The targets are 8, 11 and 4 characters long; everything else is
        // passed over without decoding.
        let length = pool.declared_length(reader, index)?;
        if length != 4 && length != 8 && length != 11 {
            continue;
        }
        match pool.string_at(reader, index)?.as_str() {
            MANIFEST_ELEMENT => tokens.manifest = Some(index),
            APPLICATION_ELEMENT => tokens.application = Some(index),
            ICON_ATTRIBUTE => tokens.icon = Some(index),
            _ => {}
        }
        if tokens.complete() {
            break;
        }
    }

    trace!(
        "manifest name tokens: manifest={:?} application={:?} icon={:?}",
        tokens.manifest,
        tokens.application,
        tokens.icon
    );
    Ok(tokens)
}

// An icon attribute qualifies only when it holds no raw string and its
// typed value is a reference; anything else keeps the scan going.
fn find_icon_attribute(
    reader: &mut ChunkReader,
    element: &XmlStartElementChunk,
    names: &NameTokens
) -> Result<Option<u32>> {
    for _ in 0..element.attribute_count {
        let attribute: XmlAttributeChunk = reader.read_struct()?;
        if Some(attribute.name) != names.icon {
            continue;
        }
        if attribute.raw_value == UINT32_MINUS_ONE
            && attribute.typed_value.data_type == DATA_TYPE_REFERENCE
        {
            return Ok(Some(attribute.typed_value.data));
        }
    }
    Ok(None)
}
