use serde::{Deserialize, Serialize};

/// Details of the account a user session belongs to. Retrieved with the
/// [`account_details`-function](crate::client::ScopedClient::account_details).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    id: u64,
    username: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    include_adult: bool,
    iso_639_1: Option<String>,
    iso_3166_1: Option<String>,
}

impl AccountDetails {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The display name of the user. The service returns an empty string for users that haven't set one; those are
    /// returned as `None`.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn include_adult(&self) -> bool {
        self.include_adult
    }

    pub fn language(&self) -> Option<&str> {
        self.iso_639_1.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.iso_3166_1.as_deref()
    }
}
