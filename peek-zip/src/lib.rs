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

use peek_common::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::{result::ZipError, ZipArchive};

/// An APK opened for repeated entry reads.
pub struct Package {
    archive: ZipArchive<File>
}

impl Package {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        Ok(Self { archive })
    }

    /// Read one entry by its exact archive path. Entry names are
    /// forward-slash separated and case-sensitive, exactly as the resource
    /// table spells them.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Err(PeekError::EntryNotFound(name.to_string())),
            Err(other) => return Err(other.into())
        };
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }
}
