//! Login state and the active company.
//!
//! A [`Session`] is an immutable value: every transition consumes the old
//! session and returns a new one. Persisting it between runs is the caller's
//! business (the CLI writes it to a JSON file).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("no company selected")]
    NoCompany,

    #[error("not logged in")]
    NotAuthenticated,
}

/// The single accepted credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPolicy {
    pub username: String,
    pub password: String,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            username: "user".into(),
            password: "user".into(),
        }
    }
}

impl AuthPolicy {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn accepts(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated { user: String, company: String },
}

impl Session {
    pub fn anonymous() -> Self {
        Session::Anonymous
    }

    /// Check credentials and bind the session to `company`.
    pub fn login(
        self,
        policy: &AuthPolicy,
        username: &str,
        password: &str,
        company: &str,
    ) -> Result<Session, SessionError> {
        if username.trim().is_empty() {
            return Err(SessionError::MissingField("username"));
        }
        if password.is_empty() {
            return Err(SessionError::MissingField("password"));
        }
        if company.trim().is_empty() {
            return Err(SessionError::NoCompany);
        }
        if !policy.accepts(username, password) {
            return Err(SessionError::InvalidCredentials);
        }
        info!(user = username, company, "logged in");
        Ok(Session::Authenticated {
            user: username.to_string(),
            company: company.trim().to_string(),
        })
    }

    /// Drop user and company. Logging out of an anonymous session is a no-op.
    pub fn logout(self) -> Session {
        if let Session::Authenticated { user, .. } = &self {
            info!(user = %user, "logged out");
        }
        Session::Anonymous
    }

    /// Rebind an authenticated session to another company.
    pub fn switch_company(self, company: &str) -> Result<Session, SessionError> {
        let company = company.trim();
        if company.is_empty() {
            return Err(SessionError::NoCompany);
        }
        match self {
            Session::Anonymous => Err(SessionError::NotAuthenticated),
            Session::Authenticated { user, .. } => {
                info!(user = %user, company, "switched company");
                Ok(Session::Authenticated {
                    user,
                    company: company.to_string(),
                })
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&str> {
        match self {
            Session::Authenticated { user, .. } => Some(user.as_str()),
            Session::Anonymous => None,
        }
    }

    pub fn company(&self) -> Option<&str> {
        match self {
            Session::Authenticated { company, .. } => Some(company.as_str()),
            Session::Anonymous => None,
        }
    }

    /// The active company id, or why there is none.
    pub fn require_company(&self) -> Result<&str, SessionError> {
        self.company().ok_or(SessionError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AuthPolicy {
        AuthPolicy::default()
    }

    #[test]
    fn login_with_demo_credentials() {
        let session = Session::anonymous()
            .login(&policy(), "user", "user", "acme")
            .unwrap();
        assert_eq!(session.user(), Some("user"));
        assert_eq!(session.company(), Some("acme"));
        assert_eq!(session.require_company().unwrap(), "acme");
    }

    #[test]
    fn login_rejects_bad_password() {
        let err = Session::anonymous()
            .login(&policy(), "user", "nope", "acme")
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidCredentials);
    }

    #[test]
    fn login_requires_every_field() {
        let p = policy();
        assert_eq!(
            Session::anonymous().login(&p, "", "user", "acme"),
            Err(SessionError::MissingField("username"))
        );
        assert_eq!(
            Session::anonymous().login(&p, "user", "", "acme"),
            Err(SessionError::MissingField("password"))
        );
        assert_eq!(
            Session::anonymous().login(&p, "user", "user", "  "),
            Err(SessionError::NoCompany)
        );
    }

    #[test]
    fn logout_clears_everything() {
        let session = Session::anonymous()
            .login(&policy(), "user", "user", "acme")
            .unwrap()
            .logout();
        assert_eq!(session, Session::Anonymous);
        assert_eq!(
            session.require_company(),
            Err(SessionError::NotAuthenticated)
        );
    }

    #[test]
    fn switch_company_keeps_user() {
        let session = Session::anonymous()
            .login(&policy(), "user", "user", "acme")
            .unwrap()
            .switch_company("globex")
            .unwrap();
        assert_eq!(session.user(), Some("user"));
        assert_eq!(session.company(), Some("globex"));
    }

    #[test]
    fn switch_company_needs_login() {
        assert_eq!(
            Session::anonymous().switch_company("globex"),
            Err(SessionError::NotAuthenticated)
        );
    }

    #[test]
    fn custom_policy() {
        let p = AuthPolicy::new("admin", "s3cret");
        assert!(Session::anonymous().login(&p, "user", "user", "acme").is_err());
        assert!(Session::anonymous().login(&p, "admin", "s3cret", "acme").is_ok());
    }

    #[test]
    fn session_json_is_tagged() {
        let session = Session::Authenticated {
            user: "user".into(),
            company: "acme".into(),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["state"], "authenticated");
        assert_eq!(json["company"], "acme");
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);

        let anon: Session = serde_json::from_str(r#"{"state":"anonymous"}"#).unwrap();
        assert!(!anon.is_authenticated());
    }
}
