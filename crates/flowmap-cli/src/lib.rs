//! Library side of the `flowmapper` binary: logging setup and the map
//! pipeline, kept here so they can be tested without spawning the binary.

pub mod logging;
pub mod pipeline;
