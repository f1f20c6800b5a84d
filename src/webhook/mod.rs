
use http::HeaderMap;
use strum_macros::{Display, EnumString};

use crate::error::Error;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// User lifecycle operation driven by identity provider webhooks.
#[derive(Display, EnumString, Debug, Copy, Clone, PartialEq, Eq)]
pub enum WebhookOperation {
    #[strum(serialize = "insert")]
    Insert,
    #[strum(serialize = "update")]
    Update,
    #[strum(serialize = "delete")]
    Delete,
}

impl WebhookOperation {
    /// Event `type` this operation reacts to. Others are ignored.
    pub fn event_type(&self) -> &'static str {
        match self {
            WebhookOperation::Insert => "user.created",
            WebhookOperation::Update => "user.updated",
            WebhookOperation::Delete => "user.deleted",
        }
    }

    /// Environment variable holding the signing secret.
    pub fn env_key(&self) -> &'static str {
        match self {
            WebhookOperation::Insert => "SIGNING_SECRET_INSERT",
            WebhookOperation::Update => "SIGNING_SECRET_UPDATE",
            WebhookOperation::Delete => "SIGNING_SECRET_DELETE",
        }
    }

    /// Parameter store name holding the signing secret.
    pub fn parameter_name(&self) -> String {
        format!("/sim-feed/signing-secret/{}", self)
    }

    /// `username` is part of the payload for everything but deletion.
    pub fn requires_username(&self) -> bool {
        !matches!(self, WebhookOperation::Delete)
    }
}

/// The three signature headers. Absent headers read as empty strings.
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };
        Self {
            id: get(HEADER_ID),
            timestamp: get(HEADER_TIMESTAMP),
            signature: get(HEADER_SIGNATURE),
        }
    }

    /// The header map handed to the verifier (`http` 1.x, as `svix` expects).
    fn to_header_map(&self) -> Result<http1::HeaderMap, Error> {
        let mut map = http1::HeaderMap::new();
        for (name, value) in [
            (HEADER_ID, &self.id),
            (HEADER_TIMESTAMP, &self.timestamp),
            (HEADER_SIGNATURE, &self.signature),
        ] {
            let value = http1::HeaderValue::from_str(value)
                .map_err(|e| Error::SignatureValidationError(format!("{}: {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Verifier for identity provider webhooks, backed by the `svix` library.
pub struct Webhook {
    inner: svix::webhooks::Webhook,
}

impl Webhook {
    /// `secret` is `whsec_<base64 key>`.
    pub fn new(secret: &str) -> Result<Self, Error> {
        let inner = svix::webhooks::Webhook::new(secret)
            .map_err(|e| Error::SignatureValidationError(format!("{:?}", e)))?;
        Ok(Self { inner })
    }

    /// Validate `payload` against the signature headers.
    pub fn verify(&self, payload: &str, headers: &WebhookHeaders) -> Result<(), Error> {
        self.inner
            .verify(payload.as_bytes(), &headers.to_header_map()?)
            .map_err(|e| Error::SignatureValidationError(format!("{:?}", e)))
    }

    #[cfg(test)]
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &str) -> String {
        self.inner
            .sign(msg_id, timestamp, payload.as_bytes())
            .unwrap()
    }
}
