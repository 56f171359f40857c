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

//! # PEEK API
//!
//! This crate exposes the main public API through which other projects can
//! pull the application icon out of an APK.
//!
//! ## Extracting an icon
//!
//! ```no_run
//! use std::path::Path;
//!
//! let icon = peek_api::extract_icon(Path::new("app.apk")).unwrap();
//! icon.save("app.png").unwrap();
//! ```
//!
//! The whole resolution happens in memory: the compiled manifest is walked
//! for the `application` element's `icon` resource reference, the resource
//! table resolves that reference into one candidate path per device
//! configuration, and the largest decodable candidate wins.

use std::path::Path;

use log::debug;
use peek_asset_decoder::{resource_table::resolve_icon_paths, xml_file::find_icon_reference};
use peek_zip::Package;

pub use image::DynamicImage;
pub use peek_common::{PeekError, Result};

const MANIFEST_ENTRY: &str = "AndroidManifest.xml";
const RESOURCE_TABLE_ENTRY: &str = "resources.arsc";

/// Extract the application icon from the APK at `apk_path`.
///
/// Every candidate path declared by the resource table must exist in the
/// archive and decode as an image — a package whose table points at
/// missing or undecodable entries fails the whole extraction rather than
/// producing a partial answer. Among the decoded candidates the one with
/// the strictly greatest pixel area is returned; candidates of equal area
/// keep the earliest one.
pub fn extract_icon(apk_path: &Path) -> Result<DynamicImage> {
    let mut package = Package::open(apk_path)?;

    let manifest = package.read_entry(MANIFEST_ENTRY)?;
    let reference = find_icon_reference(&manifest)?;
    debug!("application icon resource reference {:#010x}", reference);

    let table = package.read_entry(RESOURCE_TABLE_ENTRY)?;
    let paths = resolve_icon_paths(&table, reference)?;
    debug!("{} candidate icon path(s): {:?}", paths.len(), paths);

    let mut best: Option<DynamicImage> = None;
    let mut best_area: u64 = 0;
    for path in &paths {
        let bytes = package.read_entry(path)?;
        let icon = image::load_from_memory(&bytes)?;
        let area = u64::from(icon.width()) * u64::from(icon.height());
        if area > best_area {
            best_area = area;
            best = Some(icon);
        }
    }

    match best {
        Some(icon) => {
            debug!("selected {}x{} icon", icon.width(), icon.height());
            Ok(icon)
        }
        None => Err(PeekError::NoIconProduced)
    }
}
