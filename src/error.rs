//! Error types for the waypoint rover

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Rover error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Route delta is not a single grid step along one axis
    #[error("Invalid move: ({dx}, {dy}) is not a single grid step")]
    InvalidMove {
        /// X delta between consecutive waypoints
        dx: i32,
        /// Y delta between consecutive waypoints
        dy: i32,
    },

    /// Route is structurally unusable (empty, duplicated arc edge, ...)
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// No candidate bus address produced a working controller
    #[error("Hardware initialization failed at {attempted:02X?}: {last_error}")]
    HardwareInit {
        /// Every address probed, in order
        attempted: Vec<u16>,
        /// Error reported by the last candidate
        last_error: String,
    },

    /// Audio capture or transcription failed
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Register level bus I/O failure
    #[error("Bus error: {0}")]
    Bus(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operator requested shutdown between mission steps
    #[error("Mission interrupted")]
    Interrupted,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
