#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Unknown(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("no role provided")]
    MissingRole,

    #[error("no role duration provided")]
    MissingDuration,

    #[error("no request token url provided")]
    MissingTokenUrl,

    #[error("only script formats of [shell credential_file] are supported (given: {0:?})")]
    UnsupportedFormat(String),

    #[error("no request token provided - make sure you have set `id_request: yes` in the step")]
    MissingToken,

    #[error("{0} can only be used with the credential_file script format")]
    IncompatibleOption(&'static str),

    #[error("failed to generate ID token: {0}")]
    TokenError(#[source] Box<Error>),

    #[error("failed to assume role: {0}")]
    AssumeRoleError(#[source] Box<Error>),

    #[error("failed to verify credentials: {0}")]
    VerifyError(#[source] Box<Error>),

    #[error("profile [{profile}] already exists in credentials file {}", .path.display())]
    ProfileExists {
        profile: String,
        path: std::path::PathBuf,
    },

    #[error("failed to write credentials to {}: {source}", .path.display())]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    StdIoError(#[from] std::io::Error),

    #[error(transparent)]
    UrlError(#[from] url::ParseError),

    #[error(transparent)]
    HttpError(#[from] http::Error),

    #[error(transparent)]
    InvaildHeaderError(#[from] reqwest::header::InvalidHeaderName),

    #[error(transparent)]
    InvalidHeaderValueError(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("API Error ({0}): {1}")]
    ApiError(reqwest::StatusCode, String),
}

impl Error {
    /// Errors raised before any network call is made
    pub fn is_config_error(&self) -> bool {
        matches!(
            *self,
            Self::ConfigError(_)
                | Self::MissingRole
                | Self::MissingDuration
                | Self::MissingTokenUrl
                | Self::UnsupportedFormat(_)
                | Self::MissingToken
                | Self::IncompatibleOption(_)
        )
    }

    pub(crate) fn token(self) -> Self {
        Self::TokenError(Box::new(self))
    }

    pub(crate) fn assume_role(self) -> Self {
        Self::AssumeRoleError(Box::new(self))
    }

    pub(crate) fn verify(self) -> Self {
        Self::VerifyError(Box::new(self))
    }
}
