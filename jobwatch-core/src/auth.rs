//! Authorization handshake used by the `jobwatch-auth` binary.
//!
//! The token protocol is delegated to the `oauth2` crate; this module only
//! sequences it: build the authorization URL, take the verifier the operator
//! copied back, exchange it for an access credential.

use std::io::{BufRead, Write};

use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use tracing::debug;
use url::Url;

use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::job::AccessCredential;

pub struct AuthFlow {
    client: BasicClient,
    scopes: Vec<String>,
}

/// An authorization request waiting for the operator.
pub struct PendingAuthorization {
    pub url: Url,
    pub state: CsrfToken,
    verifier: PkceCodeVerifier,
}

impl AuthFlow {
    pub fn new(config: &OAuthConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            config
                .client_secret
                .as_ref()
                .filter(|secret| !secret.is_empty())
                .map(|secret| ClientSecret::new(secret.clone())),
            AuthUrl::new(config.auth_url.clone())?,
            Some(TokenUrl::new(config.token_url.clone())?),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone())?);

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
        })
    }

    pub fn begin(&self) -> PendingAuthorization {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(challenge);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, state) = request.url();
        debug!(url = %url, "authorization url built");
        PendingAuthorization {
            url,
            state,
            verifier,
        }
    }

    /// Exchanges what the operator entered for an access credential.
    pub async fn complete(
        &self,
        pending: PendingAuthorization,
        input: &str,
    ) -> Result<AccessCredential, AuthError> {
        let code = parse_verifier(input, &pending.state)?;
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pending.verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        debug!("access token received");
        Ok(AccessCredential {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
        })
    }

    /// Shows the authorization URL on `output`, reads one verifier line from
    /// `input` and completes the exchange.
    pub async fn prompt<R, W>(&self, input: &mut R, output: &mut W) -> Result<AccessCredential, AuthError>
    where
        R: BufRead,
        W: Write,
    {
        let pending = self.begin();
        write!(output, "Please, visit an url {} and enter a verifier: ", pending.url)?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        self.complete(pending, &line).await
    }
}

/// Accepts either the bare verifier or the whole callback URL.
///
/// A callback URL must carry the `state` issued with the request.
pub fn parse_verifier(input: &str, state: &CsrfToken) -> Result<String, AuthError> {
    let input = input.trim();
    let Ok(callback) = Url::parse(input) else {
        if input.is_empty() {
            return Err(AuthError::MissingCode);
        }
        return Ok(input.to_owned());
    };

    let mut code = None;
    let mut returned_state = None;
    for (key, value) in callback.query_pairs() {
        match key.as_ref() {
            "code" | "oauth_verifier" => code = Some(value.into_owned()),
            "state" => returned_state = Some(value.into_owned()),
            _ => {}
        }
    }
    if returned_state.as_deref() != Some(state.secret().as_str()) {
        return Err(AuthError::StateMismatch);
    }
    code.filter(|c| !c.is_empty()).ok_or(AuthError::MissingCode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client".into(),
            client_secret: Some("secret".into()),
            scopes: vec!["jobs:read".into()],
            ..OAuthConfig::default()
        }
    }

    #[test]
    fn authorization_url_carries_client_state_and_challenge() {
        let flow = AuthFlow::new(&config()).unwrap();
        let pending = flow.begin();
        let query: Vec<(String, String)> = pending
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |name: &str| query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

        assert_eq!(get("client_id"), Some("client"));
        assert_eq!(get("state"), Some(pending.state.secret().as_str()));
        assert_eq!(get("redirect_uri"), Some("http://localhost/complete"));
        assert_eq!(get("scope"), Some("jobs:read"));
        assert_eq!(get("code_challenge_method"), Some("S256"));
    }

    #[test]
    fn missing_client_id_is_a_config_error() {
        let cfg = OAuthConfig::default();
        assert!(matches!(AuthFlow::new(&cfg), Err(AuthError::Config(_))));
    }

    #[test]
    fn bare_verifier_is_used_verbatim() {
        let state = CsrfToken::new("s1".into());
        assert_eq!(parse_verifier("  abc123\n", &state).unwrap(), "abc123");
        assert!(matches!(parse_verifier("   ", &state), Err(AuthError::MissingCode)));
    }

    #[test]
    fn callback_url_must_match_state() {
        let state = CsrfToken::new("s1".into());
        let ok = parse_verifier("http://localhost/complete?code=xyz&state=s1", &state).unwrap();
        assert_eq!(ok, "xyz");

        let err = parse_verifier("http://localhost/complete?code=xyz&state=other", &state);
        assert!(matches!(err, Err(AuthError::StateMismatch)));

        let err = parse_verifier("http://localhost/complete?state=s1", &state);
        assert!(matches!(err, Err(AuthError::MissingCode)));
    }
}
