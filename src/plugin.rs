//! Credential exchange pipeline: validate, mint ID token, assume role, verify, write

/// Mints a build ID token scoped to an audience
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_id_token(
        &self,
        request: &crate::config::TokenRequest,
        audience: &str,
    ) -> Result<secrecy::SecretString, crate::error::Error>;
}

/// Exchanges an ID token for temporary credentials
#[async_trait::async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(
        &self,
        request: &crate::config::RoleRequest,
        token: &secrecy::SecretString,
    ) -> Result<crate::credentials::TemporaryCredentials, crate::error::Error>;
}

/// Proves freshly assumed credentials are usable
#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(
        &self,
        credentials: &crate::credentials::TemporaryCredentials,
        region: &str,
        role_arn: &str,
    ) -> Result<(), crate::error::Error>;
}

pub struct Plugin<'a> {
    token_provider: &'a dyn TokenProvider,
    role_assumer: &'a dyn RoleAssumer,
    verifier: &'a dyn CredentialVerifier,
}

impl<'a> Plugin<'a> {
    pub fn new(
        token_provider: &'a dyn TokenProvider,
        role_assumer: &'a dyn RoleAssumer,
        verifier: &'a dyn CredentialVerifier,
    ) -> Self {
        Self {
            token_provider,
            role_assumer,
            verifier,
        }
    }

    /// Run every stage in order. The first failing stage aborts the run and its error is
    /// returned as is; nothing is written unless every earlier stage succeeded.
    pub async fn exec(&self, mut config: crate::config::PluginConfig) -> Result<(), crate::error::Error> {
        config.validate()?;

        tracing::debug!("running plugin with provided configuration");

        let token = self
            .token_provider
            .fetch_id_token(&config.token, &config.audience)
            .await?;

        let credentials = self.role_assumer.assume_role(&config.role, &token).await?;

        if config.verify {
            self.verifier
                .verify(&credentials, &config.role.region, &config.role.role_arn)
                .await?;
        }

        if config.script_write {
            crate::output::write_credentials(&config, &credentials).await?;
        }

        tracing::debug!("plugin finished");

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeTokenProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl TokenProvider for FakeTokenProvider {
        async fn fetch_id_token(
            &self,
            _request: &crate::config::TokenRequest,
            audience: &str,
        ) -> Result<secrecy::SecretString, crate::error::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(audience, "sts.amazonaws.com");
            if self.fail {
                return Err(crate::error::Error::ApiError(
                    reqwest::StatusCode::UNAUTHORIZED,
                    "unauthorized".to_string(),
                )
                .token());
            }
            Ok(secrecy::SecretString::new(
                crate::dev::TEST_ID_TOKEN.to_string(),
            ))
        }
    }

    #[derive(Default)]
    struct FakeRoleAssumer {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl RoleAssumer for FakeRoleAssumer {
        async fn assume_role(
            &self,
            request: &crate::config::RoleRequest,
            token: &secrecy::SecretString,
        ) -> Result<crate::credentials::TemporaryCredentials, crate::error::Error> {
            use secrecy::ExposeSecret as _;

            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(token.expose_secret(), crate::dev::TEST_ID_TOKEN);
            assert_eq!(request.role_arn, crate::dev::TEST_ROLE_ARN);
            if self.fail {
                return Err(crate::error::Error::ApiError(
                    reqwest::StatusCode::FORBIDDEN,
                    "AccessDenied".to_string(),
                )
                .assume_role());
            }
            Ok(crate::dev::make_test_credentials())
        }
    }

    #[derive(Default)]
    struct FakeVerifier {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl CredentialVerifier for FakeVerifier {
        async fn verify(
            &self,
            credentials: &crate::credentials::TemporaryCredentials,
            region: &str,
            _role_arn: &str,
        ) -> Result<(), crate::error::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(credentials.access_key_id, crate::dev::TEST_ACCESS_KEY_ID);
            assert_eq!(region, "us-east-1");
            if self.fail {
                return Err(crate::error::Error::ApiError(
                    reqwest::StatusCode::FORBIDDEN,
                    "InvalidClientTokenId".to_string(),
                )
                .verify());
            }
            Ok(())
        }
    }

    fn make_writing_config(tmpdir: &temp_dir::TempDir) -> crate::config::PluginConfig {
        let mut config = crate::dev::make_test_config(tmpdir.path().join("aws").join("setup.sh"));
        config.script_write = true;
        config
    }

    #[tokio::test]
    async fn test_exec_writes_script() {
        let tmpdir = temp_dir::TempDir::new().unwrap();
        let (tp, ra, v) = (
            FakeTokenProvider::default(),
            FakeRoleAssumer::default(),
            FakeVerifier::default(),
        );
        let mut config = make_writing_config(&tmpdir);
        config.verify = true;

        Plugin::new(&tp, &ra, &v).exec(config).await.unwrap();

        assert_eq!(tp.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ra.calls.load(Ordering::SeqCst), 1);
        assert_eq!(v.calls.load(Ordering::SeqCst), 1);
        let content =
            std::fs::read_to_string(tmpdir.path().join("aws").join("setup.sh")).unwrap();
        assert!(content.starts_with("#!/bin/sh\n"));
    }

    #[tokio::test]
    async fn test_exec_skips_optional_stages() {
        let tmpdir = temp_dir::TempDir::new().unwrap();
        let (tp, ra, v) = (
            FakeTokenProvider::default(),
            FakeRoleAssumer::default(),
            FakeVerifier::default(),
        );
        let mut config = make_writing_config(&tmpdir);
        config.script_write = false;

        Plugin::new(&tp, &ra, &v).exec(config).await.unwrap();

        assert_eq!(ra.calls.load(Ordering::SeqCst), 1);
        assert_eq!(v.calls.load(Ordering::SeqCst), 0);
        assert!(!tmpdir.path().join("aws").exists());
    }

    #[tokio::test]
    async fn test_exec_invalid_config_makes_no_calls() {
        let tmpdir = temp_dir::TempDir::new().unwrap();
        let (tp, ra, v) = (
            FakeTokenProvider::default(),
            FakeRoleAssumer::default(),
            FakeVerifier::default(),
        );
        let mut config = make_writing_config(&tmpdir);
        config.role.role_arn = String::new();

        let err = Plugin::new(&tp, &ra, &v).exec(config).await.unwrap_err();

        assert!(matches!(err, crate::error::Error::MissingRole));
        assert_eq!(tp.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ra.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exec_token_failure_aborts() {
        let tmpdir = temp_dir::TempDir::new().unwrap();
        let tp = FakeTokenProvider {
            fail: true,
            ..Default::default()
        };
        let (ra, v) = (FakeRoleAssumer::default(), FakeVerifier::default());

        let err = Plugin::new(&tp, &ra, &v)
            .exec(make_writing_config(&tmpdir))
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::Error::TokenError(_)));
        assert_eq!(ra.calls.load(Ordering::SeqCst), 0);
        assert!(!tmpdir.path().join("aws").exists());
    }

    #[tokio::test]
    async fn test_exec_assume_role_failure_aborts() {
        let tmpdir = temp_dir::TempDir::new().unwrap();
        let ra = FakeRoleAssumer {
            fail: true,
            ..Default::default()
        };
        let (tp, v) = (FakeTokenProvider::default(), FakeVerifier::default());

        let err = Plugin::new(&tp, &ra, &v)
            .exec(make_writing_config(&tmpdir))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to assume role: API Error (403 Forbidden): AccessDenied"
        );
        assert!(!tmpdir.path().join("aws").exists());
    }

    #[tokio::test]
    async fn test_exec_verify_failure_writes_nothing() {
        let tmpdir = temp_dir::TempDir::new().unwrap();
        let v = FakeVerifier {
            fail: true,
            ..Default::default()
        };
        let (tp, ra) = (FakeTokenProvider::default(), FakeRoleAssumer::default());
        let mut config = make_writing_config(&tmpdir);
        config.verify = true;

        let err = Plugin::new(&tp, &ra, &v).exec(config).await.unwrap_err();

        assert!(matches!(err, crate::error::Error::VerifyError(_)));
        assert!(!tmpdir.path().join("aws").exists());
    }
}
