use http::{header, HeaderMap, HeaderValue};
use log::warn;

use crate::error::Error;

/// Origin used by fixed-origin routes when `ALLOWED_ORIGIN` is unset.
pub const DEFAULT_ORIGIN: &str = "https://sim-feed.com";
/// Allow-list used by origin-checked routes when `ALLOWED_ORIGIN` is unset.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["https://sim-feed.com", "https://www.sim-feed.com"];

pub const READ_METHODS: &str = "GET, POST, OPTIONS";
pub const WRITE_METHODS: &str = "GET, POST, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// Cross-origin behavior of a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// No CORS headers, no preflight handling.
    Disabled,
    /// Always `ALLOWED_ORIGIN` (or the default domain).
    Fixed { methods: &'static str },
    /// Echo the caller's origin if allowed, `*` without one, 403 otherwise.
    AllowList { methods: &'static str },
}

/// Resolved header set for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    pub origin: String,
    pub methods: &'static str,
}

impl CorsPolicy {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CorsPolicy::Disabled)
    }

    /// `Err(Forbidden)` when the request origin is not on the allow-list.
    pub fn resolve(
        &self,
        request_origin: Option<&str>,
        allowed_origin: Option<&str>,
    ) -> Result<Option<CorsHeaders>, Error> {
        match *self {
            CorsPolicy::Disabled => Ok(None),
            CorsPolicy::Fixed { methods } => Ok(Some(CorsHeaders {
                origin: allowed_origin.unwrap_or(DEFAULT_ORIGIN).to_string(),
                methods,
            })),
            CorsPolicy::AllowList { methods } => {
                let origin = match request_origin.filter(|o| !o.is_empty()) {
                    None => "*",
                    Some(origin) => {
                        let allowed = match allowed_origin {
                            Some(single) => origin == single,
                            None => DEFAULT_ALLOWED_ORIGINS.contains(&origin),
                        };
                        if !allowed {
                            warn!("Origin not allowed: {}", origin);
                            return Err(Error::Forbidden);
                        }
                        origin
                    }
                };
                Ok(Some(CorsHeaders {
                    origin: origin.to_string(),
                    methods,
                }))
            }
        }
    }
}

impl CorsHeaders {
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Ok(origin) = HeaderValue::from_str(&self.origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(self.methods),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
}
