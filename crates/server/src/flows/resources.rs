//! Error codes, descriptions, hints and debug texts used by the flows.

pub const INVALID_REQUEST: &str = "invalid_request";
pub const INVALID_REQUEST_DESCRIPTION: &str = "The request is missing a required parameter, includes an invalid parameter value, or is otherwise malformed.";

pub const INVALID_CLIENT: &str = "invalid_client";
pub const INVALID_CLIENT_DESCRIPTION: &str =
    "The client is not configured correctly for this identity provider.";
pub const MISSING_STORE_HINT: &str = "The client metadata does not name a user store.";
pub const MISSING_STORE_DEBUG: &str =
    "Add a \"store\" entry to the client metadata naming one of the configured user stores.";
pub const UNSUPPORTED_STORE_HINT: &str = "The user store named by the client is not supported.";

pub fn unsupported_store_debug(store: &str) -> String {
    format!("The user store \"{store}\" is not configured under users.clients.")
}

pub const USER_STORE_INTERACTION_FAILURE: &str = "user_store_interaction_failure";
pub const USER_STORE_INTERACTION_FAILURE_DESCRIPTION: &str =
    "An error occurred while communicating with the user store.";
pub const CLAIMS_FETCH_FAILED_HINT: &str = "The user's claims could not be retrieved.";

pub fn claims_fetch_failed_debug(store: &str, error: &str) -> String {
    format!("The user store \"{store}\" failed to return claims with error \"{error}\".")
}

pub const ADMIN_API_INTERACTION_FAILURE: &str = "admin_api_interaction_failure";
pub const ADMIN_API_INTERACTION_FAILURE_DESCRIPTION: &str =
    "An error occurred while communicating with the authorization server.";
pub const DISCOVERY_FAILED_HINT: &str = "The end-session endpoint could not be discovered.";

pub fn discovery_failed_debug(code: u16, payload: &str) -> String {
    format!("Fetching the OpenID configuration failed with code {code}: {payload}")
}

/// Interactive sub-protocol a challenge belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Login,
    Consent,
    Logout,
}

impl Flow {
    pub fn name(self) -> &'static str {
        match self {
            Flow::Login => "login",
            Flow::Consent => "consent",
            Flow::Logout => "logout",
        }
    }

    pub fn challenge_missing_hint(self) -> &'static str {
        match self {
            Flow::Login => "The login challenge is missing.",
            Flow::Consent => "The consent challenge is missing.",
            Flow::Logout => "The logout challenge is missing.",
        }
    }

    pub fn challenge_missing_debug(self) -> &'static str {
        match self {
            Flow::Login => "The login_challenge query parameter is absent or empty.",
            Flow::Consent => "The consent_challenge query parameter is absent or empty.",
            Flow::Logout => "The logout_challenge query parameter is absent or empty.",
        }
    }

    pub fn challenge_invalid_hint(self) -> &'static str {
        match self {
            Flow::Login => "The login challenge is invalid or has expired.",
            Flow::Consent => "The consent challenge is invalid or has expired.",
            Flow::Logout => "The logout challenge is invalid or has expired.",
        }
    }

    pub fn challenge_invalid_debug(self, code: u16, payload: &str) -> String {
        format!(
            "Fetching the {} request failed with code {code}: {payload}",
            self.name()
        )
    }

    pub fn complete_failed_hint(self) -> &'static str {
        match self {
            Flow::Login => "The login request could not be completed.",
            Flow::Consent => "The consent request could not be completed.",
            Flow::Logout => "The logout request could not be completed.",
        }
    }

    pub fn complete_failed_debug(self, code: u16, payload: &str) -> String {
        format!(
            "Completing the {} request failed with code {code}: {payload}",
            self.name()
        )
    }

    pub fn reject_failed_hint(self) -> &'static str {
        match self {
            Flow::Login => "The login request could not be rejected.",
            Flow::Consent => "The consent request could not be rejected.",
            Flow::Logout => "The logout request could not be rejected.",
        }
    }

    pub fn reject_failed_debug(self, code: u16, payload: &str) -> String {
        format!(
            "Rejecting the {} request failed with code {code}: {payload}",
            self.name()
        )
    }
}

/// Form field messages.
pub const CHALLENGE_REQUIRED: &str = "The challenge is required.";
pub const STORE_REQUIRED: &str = "The user store is required.";
pub const USERNAME_REQUIRED: &str = "The username is required.";
pub const PASSWORD_REQUIRED: &str = "The password is required.";
