/// Grid keys and rendered candidate frames
pub mod frame;
/// Scan outcomes and reports
pub mod outcome;
/// Encoded input bytes
pub mod raw_image;
/// Supported code symbologies
pub mod symbology;

pub use frame::{CandidateFrame, CandidateKey, Rotation};
pub use outcome::{DecodeResult, ScanOutcome, ScanReport};
pub use raw_image::RawImage;
pub use symbology::Symbology;
