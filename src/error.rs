use std::path::PathBuf;

/// Which side of a delay query an endpoint was passed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSide {
    /// Usually the transmitter.
    A,
    /// Usually the receiver.
    B,
}

impl std::fmt::Display for EndpointSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointSide::A => write!(f, "a (usually TX)"),
            EndpointSide::B => write!(f, "b (usually RX)"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DelayError {
    #[error("endpoint {0} is not linked to a node; the channel service cannot track an unidentified point")]
    MissingIdentity(EndpointSide),
    #[error("endpoint {0} has a non-finite position")]
    NonFinitePosition(EndpointSide),
    #[error("invalid propagation delay: {0} s")]
    InvalidDelay(f64),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("channel bridge used before configuration")]
    NotConfigured,
    #[error("channel bridge is already configured")]
    AlreadyConfigured,
    #[error("channel bridge has been shut down")]
    ShutDown,
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("channel service error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("invalid reply from channel service: {0}")]
    InvalidReply(String),
    #[error("progress log: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
