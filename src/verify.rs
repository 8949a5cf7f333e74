//! Verify assumed credentials with sts:GetCallerIdentity

#[derive(Debug, Default)]
pub struct CallerIdentityVerifier {
    endpoint: Option<url::Url>,
}

impl CallerIdentityVerifier {
    pub fn with_endpoint(endpoint: url::Url) -> Self {
        Self {
            endpoint: Some(endpoint),
        }
    }

    async fn check(
        &self,
        credentials: &crate::credentials::TemporaryCredentials,
        region: &str,
    ) -> Result<crate::client::GetCallerIdentityResult, crate::error::Error> {
        let client = match self.endpoint {
            Some(ref e) => crate::client::Client::with_endpoint(region, e.clone())?,
            None => crate::client::Client::new(region)?,
        };
        client.get_caller_identity(credentials).await
    }
}

#[async_trait::async_trait]
impl crate::plugin::CredentialVerifier for CallerIdentityVerifier {
    async fn verify(
        &self,
        credentials: &crate::credentials::TemporaryCredentials,
        region: &str,
        role_arn: &str,
    ) -> Result<(), crate::error::Error> {
        let identity = self
            .check(credentials, region)
            .await
            .map_err(crate::error::Error::verify)?;
        tracing::info!(message = "successfully validated credentials", role_arn = %role_arn, caller_arn = %identity.arn, account = %identity.account);
        Ok(())
    }
}
