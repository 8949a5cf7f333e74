//! Vela API client for minting build ID tokens

#[derive(Debug, serde::Deserialize)]
struct IdTokenResponse {
    token: secrecy::SecretString,
}

pub struct Client {
    http_client: reqwest::Client,
    base_url: url::Url,
}

/// API base URL on the same host the request token URL points at
pub fn base_url_from_request_url(request_token_url: &str) -> Result<url::Url, crate::error::Error> {
    let url = url::Url::parse(request_token_url)?;
    let host = url.host_str().ok_or_else(|| {
        crate::error::Error::ConfigError(format!(
            "request token url has no host: {request_token_url}"
        ))
    })?;
    Ok(url::Url::parse(&format!("https://{host}/"))?)
}

impl Client {
    pub fn new(base_url: url::Url) -> Result<Self, crate::error::Error> {
        let http_client = reqwest::ClientBuilder::new()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn id_token_url(
        &self,
        org: &str,
        repo: &str,
        build: i64,
        audience: &[&str],
    ) -> Result<url::Url, crate::error::Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                crate::error::Error::ConfigError(format!(
                    "vela base url cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "v1", "repos", org, repo, "builds"])
            .push(&build.to_string())
            .push("id_token");
        {
            let mut query = url.query_pairs_mut();
            for aud in audience {
                query.append_pair("audience", aud);
            }
        }
        Ok(url)
    }

    /// `GET /api/v1/repos/{org}/{repo}/builds/{build}/id_token`
    pub async fn id_token(
        &self,
        request_token: &secrecy::SecretString,
        org: &str,
        repo: &str,
        build: i64,
        audience: &[&str],
    ) -> Result<secrecy::SecretString, crate::error::Error> {
        use secrecy::ExposeSecret as _;

        let url = self.id_token_url(org, repo, build, audience)?;
        tracing::debug!(message = "requesting ID token", url = %url);

        let resp = self
            .http_client
            .get(url)
            .bearer_auth(request_token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let body = resp.bytes().await?;
            let token: IdTokenResponse = serde_json::from_slice(&body)?;
            Ok(token.token)
        } else {
            let body = resp.text().await?;
            Err(crate::error::Error::ApiError(status, body))
        }
    }
}

/// Token provider backed by the Vela API; the endpoint is derived from the request token URL
/// unless overridden.
#[derive(Debug, Default)]
pub struct VelaTokenProvider {
    base_url: Option<url::Url>,
}

impl VelaTokenProvider {
    pub fn with_base_url(base_url: url::Url) -> Self {
        Self {
            base_url: Some(base_url),
        }
    }

    async fn fetch(
        &self,
        request: &crate::config::TokenRequest,
        audience: &str,
    ) -> Result<secrecy::SecretString, crate::error::Error> {
        let base_url = match self.base_url {
            Some(ref u) => u.clone(),
            None => base_url_from_request_url(&request.request_token_url)?,
        };
        let client = Client::new(base_url)?;
        client
            .id_token(
                &request.request_token,
                &request.org_name,
                &request.repo_name,
                request.build_number,
                &[audience],
            )
            .await
    }
}

#[async_trait::async_trait]
impl crate::plugin::TokenProvider for VelaTokenProvider {
    async fn fetch_id_token(
        &self,
        request: &crate::config::TokenRequest,
        audience: &str,
    ) -> Result<secrecy::SecretString, crate::error::Error> {
        self.fetch(request, audience)
            .await
            .map_err(crate::error::Error::token)
    }
}
