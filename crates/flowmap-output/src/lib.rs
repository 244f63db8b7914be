//! Export of flow mappings.
//!
//! - **randonneur** datapackage (JSON): every match under the `update` verb
//! - **GLAD** flow-mapping table (CSV)
//! - matched and unmatched flow lists (JSON, in the input record shape)
//!
//! [`FlowmapExport`] adds `to_randonneur`/`to_glad` to a matched
//! [`Flowmap`].

#![deny(unsafe_code)]

mod common;
pub mod error;
pub mod flows;
pub mod glad;
pub mod randonneur;

use std::path::Path;

use flowmap_map::Flowmap;

pub use error::{OutputError, Result};
pub use flows::{FlowList, write_flow_lists, write_flows};
pub use glad::{GLAD_COLUMNS, GladOptions, GladRow, build_glad_rows, write_glad, write_glad_to};
pub use randonneur::{
    Contributor, Datapackage, License, Mapping, MappingDescriptor, RandonneurOptions,
    build_datapackage, write_datapackage,
};

/// Export methods for a [`Flowmap`]. With a path the export is also
/// written to disk; the in-memory value is returned either way.
pub trait FlowmapExport {
    fn to_randonneur(
        &self,
        options: &RandonneurOptions,
        path: Option<&Path>,
    ) -> Result<Datapackage>;

    fn to_glad(&self, options: GladOptions, path: Option<&Path>) -> Result<Vec<GladRow>>;
}

impl FlowmapExport for Flowmap {
    fn to_randonneur(
        &self,
        options: &RandonneurOptions,
        path: Option<&Path>,
    ) -> Result<Datapackage> {
        let package = build_datapackage(self.matches(), options);
        if let Some(path) = path {
            write_datapackage(path, &package)?;
        }
        Ok(package)
    }

    fn to_glad(&self, options: GladOptions, path: Option<&Path>) -> Result<Vec<GladRow>> {
        let rows = build_glad_rows(self, options);
        if let Some(path) = path {
            write_glad(path, &rows)?;
        }
        Ok(rows)
    }
}
