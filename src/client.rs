//! sts:AssumeRoleWithWebIdentity and sts:GetCallerIdentity API client (AWS query protocol, JSON responses)

const SERVICE_NAME: &str = "sts";
const API_VERSION: &str = "2011-06-15";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// https://docs.aws.amazon.com/STS/latest/APIReference/API_AssumeRoleWithWebIdentity.html
#[derive(Debug)]
pub struct AssumeRoleWithWebIdentityRequest<'a> {
    pub role_arn: &'a str,
    pub role_session_name: &'a str,
    pub web_identity_token: &'a secrecy::SecretString,
    pub duration_seconds: i64,
    pub policy: Option<&'a str>,
    pub policy_arns: &'a [String],
}

impl<'a> AssumeRoleWithWebIdentityRequest<'a> {
    fn to_form(&self) -> String {
        use secrecy::ExposeSecret as _;

        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("Action", "AssumeRoleWithWebIdentity")
            .append_pair("Version", API_VERSION)
            .append_pair("RoleArn", self.role_arn)
            .append_pair("RoleSessionName", self.role_session_name)
            .append_pair("WebIdentityToken", self.web_identity_token.expose_secret())
            .append_pair("DurationSeconds", &self.duration_seconds.to_string());
        if let Some(policy) = self.policy {
            form.append_pair("Policy", policy);
        }
        for (i, arn) in self.policy_arns.iter().enumerate() {
            form.append_pair(&format!("PolicyArns.member.{}.arn", i + 1), arn);
        }
        form.finish()
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleWithWebIdentityEnvelope {
    assume_role_with_web_identity_response: AssumeRoleWithWebIdentityResponse,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleWithWebIdentityResponse {
    assume_role_with_web_identity_result: AssumeRoleWithWebIdentityResult,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleWithWebIdentityResult {
    pub credentials: Credentials,
    pub assumed_role_user: Option<AssumedRoleUser>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedRoleUser {
    pub arn: String,
    pub assumed_role_id: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: secrecy::SecretString,
    pub session_token: secrecy::SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"** redacted **")
            .field("secret_access_key", &self.secret_access_key)
            .field("session_token", &self.session_token)
            .finish()
    }
}

impl From<Credentials> for crate::credentials::TemporaryCredentials {
    fn from(c: Credentials) -> Self {
        Self {
            access_key_id: c.access_key_id,
            secret_access_key: c.secret_access_key,
            session_token: c.session_token,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCallerIdentityEnvelope {
    get_caller_identity_response: GetCallerIdentityResponse,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCallerIdentityResponse {
    get_caller_identity_result: GetCallerIdentityResult,
}

/// https://docs.aws.amazon.com/STS/latest/APIReference/API_GetCallerIdentity.html
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCallerIdentityResult {
    pub account: String,
    pub arn: String,
    pub user_id: String,
}

pub struct Client {
    http_client: reqwest::Client,
    endpoint: url::Url,
    region: String,
}

/// Regional STS endpoint
pub fn endpoint_for_region(region: &str) -> Result<url::Url, crate::error::Error> {
    let domain = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };
    Ok(url::Url::parse(&format!("https://sts.{region}.{domain}/"))?)
}

impl Client {
    pub fn new(region: &str) -> Result<Self, crate::error::Error> {
        Self::with_endpoint(region, endpoint_for_region(region)?)
    }

    pub fn with_endpoint(region: &str, endpoint: url::Url) -> Result<Self, crate::error::Error> {
        let http_client = reqwest::ClientBuilder::new().build()?;
        Ok(Self {
            http_client,
            endpoint,
            region: region.to_owned(),
        })
    }

    pub async fn assume_role_with_web_identity(
        &self,
        request: &AssumeRoleWithWebIdentityRequest<'_>,
    ) -> Result<AssumeRoleWithWebIdentityResult, crate::error::Error> {
        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, "application/json")
            .body(request.to_form())
            .send()
            .await?;

        let envelope: AssumeRoleWithWebIdentityEnvelope = Self::parse_response(resp).await?;
        Ok(envelope
            .assume_role_with_web_identity_response
            .assume_role_with_web_identity_result)
    }

    pub async fn get_caller_identity(
        &self,
        credentials: &crate::credentials::TemporaryCredentials,
    ) -> Result<GetCallerIdentityResult, crate::error::Error> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("Action", "GetCallerIdentity")
            .append_pair("Version", API_VERSION)
            .finish();

        // Use http::Request for signer
        let mut req = http::Request::builder()
            .uri(self.endpoint.as_str())
            .method(http::Method::POST)
            .header(http::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(http::header::ACCEPT, "application/json")
            .body(bytes::Bytes::from(body))?;

        let auth_headers = crate::sign::calculate_signing_headers(
            &crate::sign::SignableRequest::from(&req),
            &crate::sign::SigningParams::from_credentials(
                credentials,
                &self.region,
                SERVICE_NAME,
                chrono::Utc::now(),
            ),
        )?;

        for (k, v) in auth_headers.iter() {
            req.headers_mut().append(k, v.to_owned());
        }

        let resp = self
            .http_client
            .execute(reqwest::Request::try_from(req)?)
            .await?;

        let envelope: GetCallerIdentityEnvelope = Self::parse_response(resp).await?;
        Ok(envelope
            .get_caller_identity_response
            .get_caller_identity_result)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, crate::error::Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            let body = resp.text().await?;
            Err(crate::error::Error::ApiError(status, body))
        }
    }
}
