//! Render temporary credentials as a shell script or an AWS shared credentials file.

const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// `#!/bin/sh` script exporting the credentials; always overwritten
    Shell { region: String },
    /// `[profile]` stanza in the shared credentials file format
    CredentialFile { profile: String, append: bool },
}

impl OutputMode {
    pub fn from_config(config: &crate::config::PluginConfig) -> Result<Self, crate::error::Error> {
        Ok(match config.format()? {
            crate::config::ScriptFormat::Shell => Self::Shell {
                region: config.role.region.clone(),
            },
            crate::config::ScriptFormat::CredentialFile => Self::CredentialFile {
                profile: config
                    .profile_name
                    .clone()
                    .unwrap_or_else(|| crate::config::DEFAULT_PROFILE_NAME.to_string()),
                append: config.append_config.unwrap_or(false),
            },
        })
    }

    pub fn render(&self, credentials: &crate::credentials::TemporaryCredentials) -> String {
        match *self {
            Self::Shell { ref region } => render_shell(credentials, region),
            Self::CredentialFile { ref profile, .. } => {
                render_credential_file(credentials, profile)
            }
        }
    }

    pub async fn write(
        &self,
        path: &std::path::Path,
        credentials: &crate::credentials::TemporaryCredentials,
    ) -> Result<(), crate::error::Error> {
        let content = self.render(credentials);
        match *self {
            Self::CredentialFile {
                ref profile,
                append: true,
            } => append_profile(path, profile, &content).await,
            _ => write_file(path, &content).await,
        }
    }
}

fn render_shell(credentials: &crate::credentials::TemporaryCredentials, region: &str) -> String {
    let exports = [
        (AWS_ACCESS_KEY_ID, credentials.access_key_id.as_str()),
        (AWS_SECRET_ACCESS_KEY, credentials.secret_access_key()),
        (AWS_SESSION_TOKEN, credentials.session_token()),
        (AWS_DEFAULT_REGION, region),
    ];
    let mut script = "#!/bin/sh".to_string();
    for (k, v) in exports {
        script.push_str(&format!("\nexport {k}={v}"));
    }
    script
}

fn render_credential_file(
    credentials: &crate::credentials::TemporaryCredentials,
    profile: &str,
) -> String {
    format!(
        "[{}]\naws_access_key_id={}\naws_secret_access_key={}\naws_session_token={}",
        profile,
        credentials.access_key_id,
        credentials.secret_access_key(),
        credentials.session_token(),
    )
}

fn profile_header_exists(content: &str, profile: &str) -> bool {
    let header = format!("[{profile}]");
    content.lines().any(|line| line.trim() == header)
}

/// Write credentials to `config.script_path` in the configured format
pub async fn write_credentials(
    config: &crate::config::PluginConfig,
    credentials: &crate::credentials::TemporaryCredentials,
) -> Result<(), crate::error::Error> {
    let mode = OutputMode::from_config(config)?;
    mode.write(&config.script_path, credentials).await?;
    tracing::info!(message = "wrote credentials", script_path = ?config.script_path, script_format = %config.script_format);
    Ok(())
}

async fn append_profile(
    path: &std::path::Path,
    profile: &str,
    stanza: &str,
) -> Result<(), crate::error::Error> {
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(v) => v,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return write_file(path, stanza).await;
        }
        Err(source) => {
            return Err(crate::error::Error::WriteError {
                path: path.to_owned(),
                source,
            })
        }
    };

    if profile_header_exists(&existing, profile) {
        return Err(crate::error::Error::ProfileExists {
            profile: profile.to_owned(),
            path: path.to_owned(),
        });
    }

    let merged = if existing.trim().is_empty() {
        stanza.to_owned()
    } else {
        format!("{}\n{}", existing.trim_end_matches('\n'), stanza)
    };
    write_file(path, &merged).await
}

async fn write_file(path: &std::path::Path, content: &str) -> Result<(), crate::error::Error> {
    write_file_inner(path, content)
        .await
        .map_err(|source| crate::error::Error::WriteError {
            path: path.to_owned(),
            source,
        })
}

async fn write_file_inner(path: &std::path::Path, content: &str) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(parent)
            .await?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
