//! Catalog feed decoding
//!
//! - `model`: transient title entries as they appear in the feed
//! - `extract`: pure derivation of the persisted fields
//! - `decoder`: streaming walk over the feed document

pub mod decoder;
pub mod extract;
pub mod model;

pub use decoder::{decode_feed, DecodeStats};
pub use extract::ResourceKind;
pub use model::{Link, TitleEntry, TitleName};
