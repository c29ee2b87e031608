//! API credential handling.
//!
//! The credential is an explicit object constructed once at startup and
//! passed into the components that need it. It lives only in memory, is
//! zeroed on drop, and is never logged or written to disk.

use crate::error::AgentError;
use zeroize::Zeroizing;

/// Environment variable holding the bearer token.
pub const TOKEN_ENV_VAR: &str = "REPLICATE_API_TOKEN";

/// Shortest token length accepted by the interactive prompt.
const MIN_TOKEN_LEN: usize = 20;

/// Bearer credential for the prediction API.
pub struct ApiCredential {
    token: Zeroizing<String>,
}

impl ApiCredential {
    /// Wrap a token. Empty tokens are rejected.
    pub fn new(token: String) -> Result<Self, AgentError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(AgentError::Config("API token cannot be empty".to_string()));
        }
        Ok(Self {
            token: Zeroizing::new(trimmed.to_string()),
        })
    }

    /// Read the credential from the environment, if set.
    pub fn from_env() -> Option<Result<Self, AgentError>> {
        std::env::var(TOKEN_ENV_VAR).ok().map(Self::new)
    }

    /// Obtain a credential: environment first, interactive prompt otherwise.
    ///
    /// Failure here is a startup configuration error; the caller prints setup
    /// instructions and exits non-zero.
    pub fn obtain() -> Result<Self, AgentError> {
        if let Some(result) = Self::from_env() {
            return result;
        }
        Self::prompt()
    }

    /// Prompt interactively for a token, reprompting until it looks valid.
    pub fn prompt() -> Result<Self, AgentError> {
        println!("\nBlink needs your Replicate API token.");
        println!("The token is held in memory only and cleared on exit.");
        println!("Get one at https://replicate.com/signin, or set {}.\n", TOKEN_ENV_VAR);

        let token: String = dialoguer::Password::new()
            .with_prompt("REPLICATE_API_TOKEN")
            .validate_with(|input: &String| -> Result<(), &str> {
                if input.trim().is_empty() {
                    Err("Token cannot be empty")
                } else if input.trim().len() < MIN_TOKEN_LEN {
                    Err("Token appears too short. Check your token")
                } else {
                    Ok(())
                }
            })
            .interact()
            .map_err(|e| {
                AgentError::Config(format!(
                    "No API token available ({}). Set {} and restart.",
                    e, TOKEN_ENV_VAR
                ))
            })?;

        Self::new(token)
    }

    /// Borrow the raw token for request authorization.
    pub fn expose(&self) -> &str {
        &self.token
    }

    /// Zero the credential in place, ahead of drop.
    pub fn clear(&mut self) {
        use zeroize::Zeroize;
        self.token.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(ApiCredential::new("   ".to_string()).is_err());
    }

    #[test]
    fn token_is_trimmed_and_exposed() {
        let credential = ApiCredential::new("  r8_test_token_abcdefgh  ".to_string()).unwrap();
        assert_eq!(credential.expose(), "r8_test_token_abcdefgh");
    }

    #[test]
    fn clear_wipes_the_token() {
        let mut credential = ApiCredential::new("r8_test_token_abcdefgh".to_string()).unwrap();
        credential.clear();
        assert!(credential.expose().is_empty());
    }
}
