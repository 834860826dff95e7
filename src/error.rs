use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Broad category of a [`GraphError`], used by the host to pick a failure state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The dataset cannot be turned into a graph. The load fails as a whole.
    DataIntegrity,
    /// Canvas or layout parameters are unusable. Nothing is started.
    Configuration,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("node #{0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate node name `{0}`")]
    DuplicateNode(String),

    #[error("node `{name}` has invalid weight {weight}")]
    InvalidWeight { name: String, weight: f64 },

    #[error("link #{link} references unknown node `{name}`")]
    UnknownEndpoint { link: usize, name: String },

    #[error("link #{link} has invalid weight {weight}")]
    InvalidLinkWeight { link: usize, weight: f64 },

    #[error("cluster `{name}` has invalid color `{color}`")]
    InvalidClusterColor { name: String, color: String },

    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },

    #[error("invalid layout configuration: {0}")]
    InvalidConfig(String),
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCanvas { .. } | Self::InvalidConfig(_) => ErrorKind::Configuration,
            _ => ErrorKind::DataIntegrity,
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedDataset(error.to_string())
    }
}
