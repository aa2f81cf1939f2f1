//! Authentication against the reservation site.
//!
//! Runs once per process. A failure here is fatal: there is no point
//! polling for seats without a logged-in session.

use secrecy::SecretString;
use tracing::info;

use crate::config::{ConfigError, SessionConfig};
use crate::site::{LoginSurface, SiteError};
use crate::wait::wait_until;

/// Environment variable holding the member id.
pub const IDENTITY_ENV: &str = "SRT_ID";

/// Environment variable holding the password.
pub const SECRET_ENV: &str = "SRT_PASSWORD";

/// Errors from logging in.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    /// The login form's fields or submit control never appeared
    #[error("login form unavailable: {0}")]
    FieldsMissing(#[source] SiteError),

    /// The browser was still on the login form when the wait ran out
    #[error("still on the login page after {waited:?}; check the credentials")]
    StillOnLoginPage { waited: std::time::Duration },

    /// Any other browser failure during login
    #[error("login failed: {0}")]
    Site(#[source] SiteError),
}

impl From<SiteError> for AuthenticationError {
    fn from(err: SiteError) -> Self {
        match err {
            SiteError::ElementNotFound { .. } | SiteError::Timeout { .. } => {
                AuthenticationError::FieldsMissing(err)
            }
            other => AuthenticationError::Site(other),
        }
    }
}

/// Member id and password for the site.
///
/// The password is held as a secret and never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    identity: String,
    secret: SecretString,
}

impl Credentials {
    /// Create credentials from an id and password.
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Read credentials from [`IDENTITY_ENV`] and [`SECRET_ENV`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        Ok(Self::new(read(IDENTITY_ENV)?, read(SECRET_ENV)?))
    }

    /// Returns the member id.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the password.
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

/// Logs in and owns nothing else; the authenticated browsing context lives
/// in the surface and is reused by every later component.
pub struct SessionController<'a, S: LoginSurface> {
    surface: &'a S,
    config: &'a SessionConfig,
}

impl<'a, S: LoginSurface> SessionController<'a, S> {
    /// Create a new session controller.
    pub fn new(surface: &'a S, config: &'a SessionConfig) -> Self {
        Self { surface, config }
    }

    /// Log in with `credentials`. Not retried.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<(), AuthenticationError> {
        info!(identity = credentials.identity(), "logging in");

        self.surface.open_login().await?;
        self.surface.submit_credentials(credentials).await?;

        let waited = self.config.login_timeout();
        let left_login = wait_until(waited, self.config.probe_interval(), async || {
            Ok(!self.surface.on_login_page().await?)
        })
        .await
        .map_err(AuthenticationError::Site)?;

        if !left_login {
            return Err(AuthenticationError::StillOnLoginPage { waited });
        }

        info!("logged in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    /// Scripted login page.
    struct FakeLogin {
        form_present: bool,
        /// Number of probes after which the page leaves the login form.
        leaves_after: Option<usize>,
        probes: Cell<usize>,
        submitted: RefCell<Vec<(String, String)>>,
    }

    impl FakeLogin {
        fn new(form_present: bool, leaves_after: Option<usize>) -> Self {
            Self {
                form_present,
                leaves_after,
                probes: Cell::new(0),
                submitted: RefCell::new(Vec::new()),
            }
        }
    }

    impl LoginSurface for FakeLogin {
        async fn open_login(&self) -> Result<(), SiteError> {
            if self.form_present {
                Ok(())
            } else {
                Err(SiteError::Timeout {
                    what: "login id field",
                    after: Duration::from_secs(10),
                })
            }
        }

        async fn submit_credentials(&self, credentials: &Credentials) -> Result<(), SiteError> {
            self.submitted.borrow_mut().push((
                credentials.identity().to_string(),
                credentials.secret().expose_secret().to_string(),
            ));
            Ok(())
        }

        async fn on_login_page(&self) -> Result<bool, SiteError> {
            let n = self.probes.get() + 1;
            self.probes.set(n);
            Ok(self.leaves_after.is_none_or(|after| n <= after))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn login_succeeds_when_page_changes() {
        let login = FakeLogin::new(true, Some(2));
        let config = SessionConfig::default();
        let session = SessionController::new(&login, &config);

        session
            .authenticate(&Credentials::new("member", "pw"))
            .await
            .unwrap();

        assert_eq!(
            *login.submitted.borrow(),
            vec![("member".to_string(), "pw".to_string())]
        );
        assert_eq!(login.probes.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn login_fails_when_page_never_changes() {
        let login = FakeLogin::new(true, None);
        let config = SessionConfig::default();
        let session = SessionController::new(&login, &config);

        let err = session
            .authenticate(&Credentials::new("member", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuthenticationError::StillOnLoginPage { waited } if waited == config.login_timeout()
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_form_is_reported() {
        let login = FakeLogin::new(false, Some(0));
        let config = SessionConfig::default();
        let session = SessionController::new(&login, &config);

        let err = session
            .authenticate(&Credentials::new("member", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthenticationError::FieldsMissing(_)));
        assert!(login.submitted.borrow().is_empty());
    }

    #[test]
    fn driver_errors_are_not_missing_fields() {
        let err = AuthenticationError::from(SiteError::driver("session deleted"));
        assert!(matches!(err, AuthenticationError::Site(_)));

        let err = AuthenticationError::from(SiteError::ElementNotFound { what: "login submit" });
        assert!(matches!(err, AuthenticationError::FieldsMissing(_)));
    }

    #[test]
    fn secret_not_in_debug_output() {
        let creds = Credentials::new("member", "hunter2");
        let debug = format!("{creds:?}");

        assert!(debug.contains("member"));
        assert!(!debug.contains("hunter2"));
    }
}
