//! Transient directory listings (calendars, users).

use serde::{Deserialize, Serialize};

/// A calendar owned by the synchronised mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub name: String,
    pub owner_name: Option<String>,
    pub owner_address: Option<String>,
}

/// A user in the tenant directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
}

/// The user a delegated (device code) token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
}

impl SignedInUser {
    /// `mail`, falling back to the principal name for accounts without a
    /// mailbox address.
    pub fn email(&self) -> Option<&str> {
        self.mail.as_deref().or(self.user_principal_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_falls_back_to_principal_name() {
        let user = SignedInUser {
            display_name: Some("Ada".into()),
            mail: None,
            user_principal_name: Some("ada@contoso.onmicrosoft.com".into()),
        };
        assert_eq!(user.email(), Some("ada@contoso.onmicrosoft.com"));

        let with_mail = SignedInUser { mail: Some("ada@example.com".into()), ..user };
        assert_eq!(with_mail.email(), Some("ada@example.com"));
    }
}
