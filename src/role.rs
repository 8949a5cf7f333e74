//! Web identity role assumption against the regional STS endpoint

#[derive(Debug, Default)]
pub struct WebIdentityRoleAssumer {
    endpoint: Option<url::Url>,
}

impl WebIdentityRoleAssumer {
    pub fn with_endpoint(endpoint: url::Url) -> Self {
        Self {
            endpoint: Some(endpoint),
        }
    }

    fn client(&self, region: &str) -> Result<crate::client::Client, crate::error::Error> {
        match self.endpoint {
            Some(ref e) => crate::client::Client::with_endpoint(region, e.clone()),
            None => crate::client::Client::new(region),
        }
    }

    async fn assume(
        &self,
        request: &crate::config::RoleRequest,
        token: &secrecy::SecretString,
    ) -> Result<crate::credentials::TemporaryCredentials, crate::error::Error> {
        let client = self.client(&request.region)?;

        // Duration is passed through as is; STS enforces its own bounds.
        let req = crate::client::AssumeRoleWithWebIdentityRequest {
            role_arn: &request.role_arn,
            role_session_name: &request.role_session_name,
            web_identity_token: token,
            duration_seconds: request.role_duration_seconds,
            policy: request
                .inline_session_policy
                .as_deref()
                .filter(|p| !p.is_empty()),
            policy_arns: &request.managed_session_policies,
        };
        tracing::debug!(
            role_arn = %req.role_arn,
            role_session_name = %req.role_session_name,
            duration_seconds = req.duration_seconds,
            inline_session_policy = req.policy.is_some(),
            managed_session_policies = ?req.policy_arns,
        );

        let result = client.assume_role_with_web_identity(&req).await?;
        if let Some(ref user) = result.assumed_role_user {
            tracing::info!(message = "assumed role", assumed_role_user_arn = %user.arn);
        }
        Ok(result.credentials.into())
    }
}

#[async_trait::async_trait]
impl crate::plugin::RoleAssumer for WebIdentityRoleAssumer {
    async fn assume_role(
        &self,
        request: &crate::config::RoleRequest,
        token: &secrecy::SecretString,
    ) -> Result<crate::credentials::TemporaryCredentials, crate::error::Error> {
        self.assume(request, token)
            .await
            .map_err(crate::error::Error::assume_role)
    }
}
