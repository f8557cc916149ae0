//! The login session persisted between invocations.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use vantage_core::Session;

/// Read the saved session. A missing file means nobody is logged in.
pub fn load(path: &Path) -> anyhow::Result<Session> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .with_context(|| format!("parsing session file {}", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Session::anonymous()),
        Err(e) => Err(e).with_context(|| format!("reading session file {}", path.display())),
    }
}

pub fn save(path: &Path, session: &Session) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json).with_context(|| format!("writing session file {}", path.display()))
}

/// Log out and persist the resulting anonymous session.
pub fn log_out(path: &Path, session: Session) -> anyhow::Result<Session> {
    let session = session.logout();
    save(path, &session)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::AuthPolicy;

    #[test]
    fn missing_file_is_anonymous() {
        let tmp = tempfile::TempDir::new().unwrap();
        let session = load(&tmp.path().join("session.json")).unwrap();
        assert_eq!(session, Session::Anonymous);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".vantage").join("session.json");
        let session = Session::anonymous()
            .login(&AuthPolicy::default(), "user", "user", "acme")
            .unwrap();
        save(&path, &session).unwrap();
        assert_eq!(load(&path).unwrap(), session);
    }

    #[test]
    fn log_out_persists_anonymous_session() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        let session = Session::anonymous()
            .login(&AuthPolicy::default(), "user", "user", "acme")
            .unwrap();
        save(&path, &session).unwrap();

        let session = log_out(&path, session).unwrap();
        assert_eq!(session, Session::Anonymous);
        let reloaded = load(&path).unwrap();
        assert!(!reloaded.is_authenticated());
        assert_eq!(reloaded.company(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(load(&path).is_err());
    }
}
