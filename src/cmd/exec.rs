#[derive(clap::Args, Debug, Default)]
pub struct ExecArgs {
    /// Plugin log level: trace, debug, info, warn, error, fatal or panic
    #[clap(long, env = "PARAMETER_LOG_LEVEL")]
    log_level: Option<String>,

    /// AWS region for the STS endpoint [default: us-east-1]
    #[clap(long, env = "PARAMETER_REGION")]
    region: Option<String>,
    /// IAM role ARN to assume
    #[clap(long, env = "PARAMETER_ROLE")]
    role: Option<String>,
    /// Requested session duration in seconds [default: 3600]
    #[clap(long, env = "PARAMETER_ROLE_DURATION_SECONDS")]
    role_duration_seconds: Option<String>,
    /// Role session name [default: vela]
    #[clap(long, env = "PARAMETER_ROLE_SESSION_NAME")]
    role_session_name: Option<String>,
    /// Inline IAM policy (JSON) to scope the session down
    #[clap(long, env = "PARAMETER_INLINE_SESSION_POLICY")]
    inline_session_policy: Option<String>,
    /// Comma separated ARNs of managed policies to scope the session down
    #[clap(long, env = "PARAMETER_MANAGED_SESSION_POLICIES")]
    managed_session_policies: Option<String>,

    /// Audience of the requested ID token [default: sts.amazonaws.com]
    #[clap(long, env = "PARAMETER_AUDIENCE")]
    audience: Option<String>,
    /// Call sts:GetCallerIdentity with the assumed credentials
    #[clap(long, env = "PARAMETER_VERIFY", value_name = "BOOL")]
    verify: Option<String>,

    /// Where to write credentials; defaults depend on --script-format
    #[clap(long, env = "PARAMETER_SCRIPT_PATH")]
    script_path: Option<String>,
    /// Output format: shell or credential_file [default: shell]
    #[clap(long, env = "PARAMETER_SCRIPT_FORMAT")]
    script_format: Option<String>,
    /// Write credentials to --script-path
    #[clap(long, env = "PARAMETER_SCRIPT_WRITE", value_name = "BOOL")]
    script_write: Option<String>,
    /// Add a profile to an existing credentials file instead of replacing it (credential_file only)
    #[clap(long, env = "PARAMETER_APPEND_CONFIG", value_name = "BOOL")]
    append_config: Option<String>,
    /// Profile name in the credentials file [default: default] (credential_file only)
    #[clap(long, env = "PARAMETER_PROFILE_NAME")]
    profile_name: Option<String>,

    #[clap(long, env = "VELA_BUILD_NUMBER", hide = true)]
    build_number: Option<String>,
    #[clap(long, env = "VELA_REPO_NAME", hide = true)]
    repo_name: Option<String>,
    #[clap(long, env = "VELA_REPO_ORG", hide = true)]
    org_name: Option<String>,
    #[clap(
        long = "id-token-request-token",
        env = "VELA_ID_TOKEN_REQUEST_TOKEN",
        hide_env_values = true,
        hide = true
    )]
    request_token: Option<String>,
    #[clap(
        long = "id-token-request-url",
        env = "VELA_ID_TOKEN_REQUEST_URL",
        hide = true
    )]
    request_token_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
pub async fn run(args: &ExecArgs) -> Result<(), anyhow::Error> {
    let resolver = crate::parameter::Resolver::default();

    let log_level = resolve(
        &resolver,
        &args.log_level,
        Some("AWS_CREDENTIALS_LOG_LEVEL"),
        Some("log_level"),
    )?
    .unwrap_or_else(|| "info".to_string());
    crate::cmd::init_tracing(&log_level);

    tracing::info!(
        message = "Vela AWS Credentials Config",
        code = "https://github.com/Cargill/vela-aws-credentials",
        docs = "https://go-vela.github.io/docs/plugins/registry/pipeline/aws-credentials",
        registry = "https://hub.docker.com/r/cargill/vela-aws-credentials",
    );

    let config = args.to_config(&resolver)?;

    let token_provider = crate::vela::VelaTokenProvider::default();
    let role_assumer = crate::role::WebIdentityRoleAssumer::default();
    let verifier = crate::verify::CallerIdentityVerifier::default();
    crate::plugin::Plugin::new(&token_provider, &role_assumer, &verifier)
        .exec(config)
        .await?;
    Ok(())
}

fn resolve(
    resolver: &crate::parameter::Resolver,
    value: &Option<String>,
    alias_env: Option<&str>,
    file_name: Option<&str>,
) -> Result<Option<String>, crate::error::Error> {
    let value = value.as_ref().filter(|v| !v.is_empty()).cloned();
    resolver.resolve(value, alias_env, file_name)
}

impl ExecArgs {
    pub fn to_config(
        &self,
        resolver: &crate::parameter::Resolver,
    ) -> Result<crate::config::PluginConfig, crate::error::Error> {
        use crate::parameter::{parse_bool, parse_int, split_list};

        let param = |value: &Option<String>, name: &str, file: bool| {
            let alias = format!("AWS_CREDENTIALS_{}", name.to_uppercase());
            resolve(resolver, value, Some(alias.as_str()), file.then_some(name))
        };
        let flag = |value: &Option<String>, name: &str| -> Result<Option<bool>, crate::error::Error> {
            param(value, name, false)?
                .map(|v| parse_bool(name, &v))
                .transpose()
        };

        let role = crate::config::RoleRequest {
            region: param(&self.region, "region", true)?
                .unwrap_or_else(|| "us-east-1".to_string()),
            role_arn: param(&self.role, "role", true)?.unwrap_or_default(),
            role_duration_seconds: param(&self.role_duration_seconds, "role_duration_seconds", true)?
                .map(|v| parse_int("role_duration_seconds", &v))
                .transpose()?
                .unwrap_or(3600),
            role_session_name: param(&self.role_session_name, "role_session_name", true)?
                .unwrap_or_else(|| "vela".to_string()),
            inline_session_policy: param(&self.inline_session_policy, "inline_session_policy", true)?,
            managed_session_policies: param(
                &self.managed_session_policies,
                "managed_session_policies",
                true,
            )?
            .map(|v| split_list(&v))
            .unwrap_or_default(),
        };

        let token = crate::config::TokenRequest {
            request_token: secrecy::SecretString::new(
                resolve(resolver, &self.request_token, None, None)?.unwrap_or_default(),
            ),
            request_token_url: resolve(resolver, &self.request_token_url, None, None)?
                .unwrap_or_default(),
            org_name: resolve(resolver, &self.org_name, Some("REPOSITORY_ORG"), None)?
                .unwrap_or_default(),
            repo_name: resolve(resolver, &self.repo_name, Some("REPOSITORY_NAME"), None)?
                .unwrap_or_default(),
            build_number: resolve(resolver, &self.build_number, Some("BUILD_NUMBER"), None)?
                .map(|v| parse_int("build_number", &v))
                .transpose()?
                .unwrap_or(0),
        };

        Ok(crate::config::PluginConfig {
            audience: param(&self.audience, "audience", true)?
                .unwrap_or_else(|| "sts.amazonaws.com".to_string()),
            verify: flag(&self.verify, "verify")?.unwrap_or(false),
            script_path: param(&self.script_path, "script_path", false)?
                .map(std::path::PathBuf::from)
                .unwrap_or_default(),
            script_format: param(&self.script_format, "script_format", false)?
                .unwrap_or_else(|| crate::config::ScriptFormat::Shell.as_str().to_string()),
            script_write: flag(&self.script_write, "script_write")?.unwrap_or(false),
            append_config: flag(&self.append_config, "append_config")?,
            profile_name: param(&self.profile_name, "profile_name", false)?,
            role,
            token,
        })
    }
}
