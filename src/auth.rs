use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct CredentialsBody {
    email: String,
    password: String,
}

/// Authenticated session returned by the identity backend.
///
/// Only the access token is kept; everything else about the session
/// mechanism is opaque to this client.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access_token: String,
}

/// Error body as GoTrue returns it. Field names vary across endpoints and
/// versions, so all three are optional and the first present one wins.
#[derive(Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

/// Supabase GoTrue client: password sign-in and sign-up.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        self.request(&url, email, password).await
    }

    /// Sign-up is implicit login: a successful registration yields a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        self.request(&url, email, password).await
    }

    async fn request(&self, url: &str, email: &str, password: &str) -> Result<Session> {
        let body = CredentialsBody {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("{}", error_message(status, &text)));
        }

        let session: Session = response.json().await?;
        Ok(session)
    }
}

/// Pull the human-readable message out of a GoTrue error body, falling back
/// to the raw body or the HTTP status when there is nothing better.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<AuthErrorBody>(body) {
        if let Some(message) = parsed
            .error_description
            .or(parsed.msg)
            .or(parsed.error)
        {
            return message;
        }
    }
    if body.is_empty() {
        format!("auth request failed with status {}", status)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn sign_in_returns_session_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded(
                "grant_type".into(),
                "password".into(),
            ))
            .match_header("apikey", "anon-key")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "a@b.com",
                "password": "x",
            })))
            .with_status(200)
            .with_body(r#"{"access_token":"tok-123","token_type":"bearer"}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url(), "anon-key");
        let session = client.sign_in("a@b.com", "x").await.unwrap();
        assert_eq!(session.access_token, "tok-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sign_in_surfaces_backend_error_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Invalid credentials"}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url(), "anon-key");
        let err = client.sign_in("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn sign_up_hits_signup_endpoint_and_returns_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/signup")
            .match_header("apikey", "anon-key")
            .with_status(200)
            .with_body(r#"{"access_token":"tok-new"}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url(), "anon-key");
        let session = client.sign_up("new@b.com", "pw").await.unwrap();
        assert_eq!(session.access_token, "tok-new");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sign_up_surfaces_msg_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/v1/signup")
            .with_status(422)
            .with_body(r#"{"msg":"User already registered"}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url(), "anon-key");
        let err = client.sign_up("a@b.com", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
    }

    #[test]
    fn error_message_falls_back_to_raw_body_then_status() {
        let status = reqwest::StatusCode::BAD_GATEWAY;
        assert_eq!(error_message(status, "upstream down"), "upstream down");
        assert_eq!(
            error_message(status, ""),
            "auth request failed with status 502 Bad Gateway"
        );
    }
}
