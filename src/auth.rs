use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::store::{CollectionPath, DocumentStore, StoreError};

const IDENTITY_TOOLKIT: &str = "https://identitytoolkit.googleapis.com/v1/accounts";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing api key")]
    MissingApiKey,
    #[error("network error: {0}")]
    Network(String),
    #[error("sign-in rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: Option<String>,
    pub anonymous: bool,
}

pub trait Authenticator: Send + Sync {
    fn sign_in_anonymously(&self) -> Result<Session, AuthError>;
    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;
}

/// The single admin predicate: an `admins/{email}` document exists.
pub fn is_admin(store: &dyn DocumentStore, email: Option<&str>) -> Result<bool, StoreError> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(false);
    };
    Ok(store.get(&CollectionPath::admins(), email)?.is_some())
}

/// Stamps `users/{uid}.lastLogin`.
pub fn record_login(store: &dyn DocumentStore, session: &Session) -> Result<(), StoreError> {
    let mut fields = Map::new();
    fields.insert("lastLogin".to_string(), Value::from(Utc::now().to_rfc3339()));
    store.merge(&CollectionPath::users(), &session.uid, fields)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

pub struct FirebaseAuth {
    client: Client,
    api_key: Option<String>,
}

impl FirebaseAuth {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn call(&self, endpoint: &str, body: Value, anonymous: bool) -> Result<Session, AuthError> {
        let key = self.api_key.as_deref().ok_or(AuthError::MissingApiKey)?;
        let url = format!("{IDENTITY_TOOLKIT}:{endpoint}?key={key}");
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .map_err(|err| AuthError::Network(err.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|err| AuthError::Network(err.to_string()))?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(|m| m.to_string())
                })
                .unwrap_or_else(|| format!("http {status}"));
            return Err(AuthError::Rejected(message));
        }
        let parsed: SignInResponse =
            serde_json::from_str(&text).map_err(|err| AuthError::Rejected(err.to_string()))?;
        Ok(Session {
            uid: parsed.local_id,
            email: parsed.email.filter(|e| !e.is_empty()),
            id_token: Some(parsed.id_token),
            anonymous,
        })
    }
}

impl Authenticator for FirebaseAuth {
    fn sign_in_anonymously(&self) -> Result<Session, AuthError> {
        self.call("signUp", json!({ "returnSecureToken": true }), true)
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.call(
            "signInWithPassword",
            json!({ "email": email, "password": password, "returnSecureToken": true }),
            false,
        )
    }
}

/// Offline accounts for sample mode.
pub struct SampleAuth {
    accounts: HashMap<String, String>,
    next_anon: AtomicU64,
}

impl SampleAuth {
    pub fn new(accounts: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
            next_anon: AtomicU64::new(0),
        }
    }
}

impl Authenticator for SampleAuth {
    fn sign_in_anonymously(&self) -> Result<Session, AuthError> {
        let n = self.next_anon.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Session {
            uid: format!("anon-{n}"),
            email: None,
            id_token: None,
            anonymous: true,
        })
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        match self.accounts.get(email) {
            Some(expected) if expected == password => Ok(Session {
                uid: format!("user-{}", email.replace(['@', '.'], "-")),
                email: Some(email.to_string()),
                id_token: None,
                anonymous: false,
            }),
            _ => Err(AuthError::Rejected("INVALID_LOGIN_CREDENTIALS".to_string())),
        }
    }
}
