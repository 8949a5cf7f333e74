pub const DEFAULT_SHELL_SCRIPT_PATH: &str = "/vela/secrets/aws/setup.sh";
pub const DEFAULT_CREDENTIAL_FILE_PATH: &str = "/vela/secrets/aws/creds";
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Everything the plugin needs for a single run
#[derive(Debug)]
pub struct PluginConfig {
    pub audience: String,
    pub verify: bool,
    pub script_path: std::path::PathBuf,
    /// Raw format name; parsed into [`ScriptFormat`] during validation
    pub script_format: String,
    pub script_write: bool,
    pub append_config: Option<bool>,
    pub profile_name: Option<String>,
    pub role: RoleRequest,
    pub token: TokenRequest,
}

#[derive(Debug, Clone)]
pub struct RoleRequest {
    pub region: String,
    pub role_arn: String,
    pub role_duration_seconds: i64,
    pub role_session_name: String,
    pub inline_session_policy: Option<String>,
    pub managed_session_policies: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub request_token: secrecy::SecretString,
    pub request_token_url: String,
    pub org_name: String,
    pub repo_name: String,
    pub build_number: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    Shell,
    CredentialFile,
}

impl ScriptFormat {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Shell => "shell",
            Self::CredentialFile => "credential_file",
        }
    }

    pub fn default_path(&self) -> &'static str {
        match *self {
            Self::Shell => DEFAULT_SHELL_SCRIPT_PATH,
            Self::CredentialFile => DEFAULT_CREDENTIAL_FILE_PATH,
        }
    }
}

impl std::str::FromStr for ScriptFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shell" => Ok(Self::Shell),
            "credential_file" => Ok(Self::CredentialFile),
            _ => Err(crate::error::Error::UnsupportedFormat(s.to_owned())),
        }
    }
}

impl std::fmt::Display for ScriptFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PluginConfig {
    /// Check preconditions in order, stopping at the first failure.
    ///
    /// An empty `script_path` is replaced with the default path for the chosen format.
    pub fn validate(&mut self) -> Result<(), crate::error::Error> {
        use secrecy::ExposeSecret as _;

        tracing::debug!("validating plugin configuration");

        if self.role.role_arn.is_empty() {
            return Err(crate::error::Error::MissingRole);
        }

        if self.role.role_duration_seconds <= 0 {
            return Err(crate::error::Error::MissingDuration);
        }

        if self.token.request_token_url.is_empty() {
            return Err(crate::error::Error::MissingTokenUrl);
        }

        let format = self.format()?;

        if self.script_path.as_os_str().is_empty() {
            self.script_path = format.default_path().into();
        }

        if self.token.request_token.expose_secret().is_empty() {
            return Err(crate::error::Error::MissingToken);
        }

        if format == ScriptFormat::Shell {
            if self.append_config.is_some() {
                return Err(crate::error::Error::IncompatibleOption("append_config"));
            }
            if self.profile_name.is_some() {
                return Err(crate::error::Error::IncompatibleOption("profile_name"));
            }
        }

        Ok(())
    }

    pub fn format(&self) -> Result<ScriptFormat, crate::error::Error> {
        self.script_format.parse()
    }
}
