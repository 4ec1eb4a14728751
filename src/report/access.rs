use crate::report::*;

use std::collections::BTreeMap;

/// Checks the credentials against the allow-list of the configuration.
///
/// Without an allow-list, everybody gets in and no user name is returned.
pub fn check_access(
    users: &Option<BTreeMap<String, String>>,
    user: Option<&str>,
    password: Option<&str>,
) -> ReportResult<Option<String>> {
    let users = match users {
        Some(users) => users,
        None => {
            debug!("check_access: no allow-list, access granted");
            return Ok(None);
        }
    };
    let (user, password) = match (user, password) {
        (Some(u), Some(p)) => (u, p),
        _ => return MissingCredentialsSnafu {}.fail(),
    };
    match users.get(user) {
        Some(expected) if expected == password => Ok(Some(user.to_string())),
        _ => {
            warn!("Failed login attempt for user {:?}", user);
            AccessDeniedSnafu { user }.fail()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Option<BTreeMap<String, String>> {
        let mut m = BTreeMap::new();
        m.insert("admin".to_string(), "s3cret".to_string());
        Some(m)
    }

    #[test]
    fn open_gate() {
        assert_eq!(check_access(&None, None, None).unwrap(), None);
        assert_eq!(check_access(&None, Some("x"), Some("y")).unwrap(), None);
    }

    #[test]
    fn good_credentials() {
        assert_eq!(
            check_access(&users(), Some("admin"), Some("s3cret")).unwrap(),
            Some("admin".to_string())
        );
    }

    #[test]
    fn bad_credentials() {
        assert!(matches!(
            check_access(&users(), Some("admin"), Some("S3cret")),
            Err(ReportError::AccessDenied { .. })
        ));
        assert!(matches!(
            check_access(&users(), Some("guest"), Some("s3cret")),
            Err(ReportError::AccessDenied { .. })
        ));
        assert!(matches!(
            check_access(&users(), Some("admin"), None),
            Err(ReportError::MissingCredentials { .. })
        ));
    }
}
