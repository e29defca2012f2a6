//! Error types
//!
//! Only input and configuration problems are fatal. Metadata and engine
//! failures are absorbed inside the pipeline, and "no code found" is a
//! [`ScanOutcome`](crate::ScanOutcome), not an error.

/// Fatal errors surfaced by a scan request
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The supplied buffer holds no bytes at all
    #[error("input image is empty")]
    EmptyInput,

    /// The supplied buffer exceeds the configured input limit
    #[error("input image is {size} bytes, limit is {limit}")]
    InputTooLarge {
        /// Size of the rejected buffer
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// The bytes could not be decoded as any supported raster format
    #[error("cannot decode input image{}: {source}", mime_suffix(.mime))]
    UndecodableInput {
        /// Declared MIME type, if any
        mime: Option<String>,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },

    /// Reading the input from disk failed
    #[error("cannot read input image: {0}")]
    Io(#[from] std::io::Error),

    /// The scan configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The raster surface rejected a candidate buffer
    #[error("cannot render candidate frame: {0}")]
    Render(String),
}

fn mime_suffix(mime: &Option<String>) -> String {
    match mime {
        Some(m) => format!(" ({m})"),
        None => String::new(),
    }
}

/// Invalid [`ScanConfig`](crate::ScanConfig) values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// No scales configured
    #[error("scale ladder is empty")]
    EmptyScales,

    /// A scale outside the accepted range
    #[error("scale {0} must be finite and in (0, 4]")]
    InvalidScale(f32),

    /// No rotations configured
    #[error("rotation ladder is empty")]
    EmptyRotations,

    /// A rotation that is not a multiple of 90 degrees
    #[error("rotation {0} is not a right angle (0, 90, 180, 270)")]
    InvalidRotation(i64),

    /// The same scale or rotation listed twice
    #[error("{0} appears more than once in its ladder")]
    DuplicateLadderEntry(String),

    /// No symbologies allowed
    #[error("symbology allow-list is empty")]
    EmptySymbologies,

    /// Unrecognised symbology name
    #[error("unknown symbology '{0}'")]
    UnknownSymbology(String),

    /// Minimum frame dimension of zero
    #[error("minimum dimension must be at least 1")]
    InvalidMinDimension,

    /// Gamma or contrast out of range
    #[error("preprocessing {name} must be finite and positive, got {value}")]
    InvalidPreprocess {
        /// Parameter name (`gamma` or `contrast`)
        name: &'static str,
        /// Rejected value
        value: f32,
    },

    /// Unrecognised enumeration value
    #[error("unknown {kind} '{value}'")]
    UnknownVariant {
        /// Setting being parsed
        kind: &'static str,
        /// Rejected value
        value: String,
    },

    /// Configuration document could not be parsed
    #[error("cannot parse configuration: {0}")]
    Parse(String),
}

/// Faults raised inside a decoding engine
///
/// The cascade treats every variant as a no-match for the current frame.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// The engine cannot handle this frame or configuration
    #[error("{engine}: unsupported input: {reason}")]
    Unsupported {
        /// Engine name
        engine: &'static str,
        /// Why the input was rejected
        reason: String,
    },

    /// The engine found symbol-like structure but failed to decode it
    #[error("{engine}: {reason}")]
    Failed {
        /// Engine name
        engine: &'static str,
        /// Engine-specific failure detail
        reason: String,
    },
}

/// Errors building or submitting a movement record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// A required form field is blank
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),

    /// The endpoint answered with a non-success status
    #[error("API error {status}: {message}")]
    Api {
        /// Status reported in the response envelope
        status: u16,
        /// Message reported in the response envelope
        message: String,
    },

    /// The response body is not a valid envelope
    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}
