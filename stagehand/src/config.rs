//! Account-level configuration.

use serde::{Deserialize, Serialize};

/// The publisher account an auction request is attributed to.
///
/// The executor hands the account to the plan builder so that hook plans
/// can be selected per account. Accounts are resolved by the surrounding
/// server after the entrypoint stage, which is why the entrypoint plan is
/// endpoint-scoped only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Publisher account identifier.
    #[serde(default)]
    pub id: String,
}

impl Account {
    /// Creates an account with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
