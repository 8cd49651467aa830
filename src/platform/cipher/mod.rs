//! Signature cipher extraction and interpretation

pub mod descriptor;
pub mod extractor;
pub mod operation;

pub use descriptor::{parse_cipher_descriptor, SignatureCipherDescriptor, DEFAULT_SIGNATURE_PARAM};
pub use extractor::{extract, ExtractedAlgorithm, ExtractionTrace, TraceStep};
pub use operation::{apply, Operation};
