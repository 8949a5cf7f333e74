pub const TEST_ROLE_ARN: &str = "arn:aws:iam::123456789012:role/vela";
pub const TEST_REQUEST_TOKEN: &str = "request-token";
pub const TEST_ID_TOKEN: &str = "eyJhbGciOiJSUzI1NiJ9.test.signature";
pub const TEST_ACCESS_KEY_ID: &str = "ASIAEXAMPLE";
pub const TEST_SECRET_ACCESS_KEY: &str = "SECRET_ACCESS_KEY";
pub const TEST_SESSION_TOKEN: &str = "SESSION_TOKEN";

pub fn make_test_config(script_path: std::path::PathBuf) -> crate::config::PluginConfig {
    crate::config::PluginConfig {
        audience: "sts.amazonaws.com".to_string(),
        verify: false,
        script_path,
        script_format: "shell".to_string(),
        script_write: false,
        append_config: None,
        profile_name: None,
        role: crate::config::RoleRequest {
            region: "us-east-1".to_string(),
            role_arn: TEST_ROLE_ARN.to_string(),
            role_duration_seconds: 3600,
            role_session_name: "vela".to_string(),
            inline_session_policy: None,
            managed_session_policies: vec![],
        },
        token: crate::config::TokenRequest {
            request_token: secrecy::SecretString::new(TEST_REQUEST_TOKEN.to_string()),
            request_token_url: "https://vela.test.invalid/api/v1/repos/octo/app/builds/42/id_request_token"
                .to_string(),
            org_name: "octo".to_string(),
            repo_name: "app".to_string(),
            build_number: 42,
        },
    }
}

pub fn make_test_credentials() -> crate::credentials::TemporaryCredentials {
    crate::credentials::TemporaryCredentials::new(
        TEST_ACCESS_KEY_ID.to_string(),
        TEST_SECRET_ACCESS_KEY.to_string(),
        TEST_SESSION_TOKEN.to_string(),
    )
}

#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub params: std::collections::HashMap<String, String>,
    pub authorization: Option<String>,
    pub security_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    inner: std::sync::Arc<std::sync::Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().clone()
    }

    fn push(&self, req: RecordedRequest) {
        self.inner.lock().unwrap().push(req);
    }
}

fn header_string(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}

async fn spawn(app: axum::Router) -> url::Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(app.into_make_service());
    tokio::spawn(server);
    url::Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Vela API stub serving `/api/v1/repos/:org/:repo/builds/:build/id_token`
pub async fn spawn_vela_server() -> (url::Url, Recorder) {
    let recorder = Recorder::default();
    let app = axum::Router::new()
        .route(
            "/api/v1/repos/:org/:repo/builds/:build/id_token",
            axum::routing::get(vela_id_token),
        )
        .with_state(recorder.clone());
    (spawn(app).await, recorder)
}

async fn vela_id_token(
    axum::extract::State(recorder): axum::extract::State<Recorder>,
    uri: axum::http::Uri,
    headers: axum::http::HeaderMap,
) -> (axum::http::StatusCode, String) {
    recorder.push(RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(|q| q.to_string()),
        authorization: header_string(&headers, "authorization"),
        ..Default::default()
    });

    if header_string(&headers, "authorization") != Some(format!("Bearer {TEST_REQUEST_TOKEN}")) {
        return (
            axum::http::StatusCode::UNAUTHORIZED,
            r#"{"error":"unauthorized"}"#.to_string(),
        );
    }
    (
        axum::http::StatusCode::OK,
        serde_json::json!({ "token": TEST_ID_TOKEN }).to_string(),
    )
}

/// STS stub answering AssumeRoleWithWebIdentity and GetCallerIdentity
pub async fn spawn_sts_server() -> (url::Url, Recorder) {
    let recorder = Recorder::default();
    let app = axum::Router::new()
        .route("/", axum::routing::post(sts_action))
        .with_state(recorder.clone());
    (spawn(app).await, recorder)
}

async fn sts_action(
    axum::extract::State(recorder): axum::extract::State<Recorder>,
    headers: axum::http::HeaderMap,
    body: bytes::Bytes,
) -> (axum::http::StatusCode, String) {
    let params = url::form_urlencoded::parse(&body)
        .into_owned()
        .collect::<std::collections::HashMap<String, String>>();
    let authorization = header_string(&headers, "authorization");
    let security_token = header_string(&headers, "x-amz-security-token");
    recorder.push(RecordedRequest {
        path: "/".to_string(),
        params: params.clone(),
        authorization: authorization.clone(),
        security_token: security_token.clone(),
        ..Default::default()
    });

    match params.get("Action").map(|v| v.as_str()) {
        Some("AssumeRoleWithWebIdentity") => {
            if params.get("WebIdentityToken").map(|v| v.as_str()) != Some(TEST_ID_TOKEN) {
                return (
                    axum::http::StatusCode::FORBIDDEN,
                    r#"{"Error":{"Code":"InvalidIdentityToken","Message":"Couldn't retrieve verification key from your identity provider"}}"#.to_string(),
                );
            }
            let body = serde_json::json!({
                "AssumeRoleWithWebIdentityResponse": {
                    "AssumeRoleWithWebIdentityResult": {
                        "AssumedRoleUser": {
                            "Arn": "arn:aws:sts::123456789012:assumed-role/vela/vela",
                            "AssumedRoleId": "AROAEXAMPLE:vela"
                        },
                        "Credentials": {
                            "AccessKeyId": TEST_ACCESS_KEY_ID,
                            "Expiration": 1.6617012e9,
                            "SecretAccessKey": TEST_SECRET_ACCESS_KEY,
                            "SessionToken": TEST_SESSION_TOKEN
                        },
                        "Provider": "vela.test.invalid"
                    },
                    "ResponseMetadata": { "RequestId": "00000000-0000-0000-0000-000000000000" }
                }
            });
            (axum::http::StatusCode::OK, body.to_string())
        }
        Some("GetCallerIdentity") => {
            let signed_by_test_key = authorization
                .as_deref()
                .map(|a| a.starts_with(&format!("AWS4-HMAC-SHA256 Credential={TEST_ACCESS_KEY_ID}/")))
                .unwrap_or(false);
            if !signed_by_test_key || security_token.as_deref() != Some(TEST_SESSION_TOKEN) {
                return (
                    axum::http::StatusCode::FORBIDDEN,
                    r#"{"Error":{"Code":"InvalidClientTokenId","Message":"The security token included in the request is invalid."}}"#.to_string(),
                );
            }
            let body = serde_json::json!({
                "GetCallerIdentityResponse": {
                    "GetCallerIdentityResult": {
                        "Account": "123456789012",
                        "Arn": "arn:aws:sts::123456789012:assumed-role/vela/vela",
                        "UserId": "AROAEXAMPLE:vela"
                    },
                    "ResponseMetadata": { "RequestId": "00000000-0000-0000-0000-000000000000" }
                }
            });
            (axum::http::StatusCode::OK, body.to_string())
        }
        _ => (
            axum::http::StatusCode::BAD_REQUEST,
            r#"{"Error":{"Code":"InvalidAction"}}"#.to_string(),
        )
    }
}

/// In-memory sink for a test subscriber
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    inner: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
