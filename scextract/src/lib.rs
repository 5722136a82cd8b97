//! Build-time verifier and extractor for shellcode PEs.
//!
//! The deliverable of a shellcode build is not the PE but its `.text`
//! section as a raw byte file. This crate checks that the linked image
//! actually has the all-in-one-section layout the blob depends on, then
//! extracts the bytes (patching an entry jump at offset zero if the stub
//! was not placed first).

pub mod error;
pub mod extract;
pub mod pe;

#[doc(hidden)]
pub mod testutil;

pub use error::ExtractError;
pub use extract::{extract_text, Blob};
pub use pe::PeFile;
