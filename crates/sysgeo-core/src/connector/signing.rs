use super::credentials::Credentials;
use super::error::ConnectorError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

pub const NONCE_LENGTH: usize = 25;
pub const CONTENT_TYPE: &str = "application/json";
pub const ACCEPT: &str = "application/json;charset=UTF-8; qs=0.09";

/// How requests are authenticated against the Onshape API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthScheme {
    /// Per-request HMAC-SHA256 signature over method, nonce, date, content type, path and query.
    #[default]
    HmacSha256,
    /// HTTP basic authentication with the key pair.
    Basic,
}

impl FromStr for AuthScheme {
    type Err = ConnectorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hmac" | "hmac-sha256" | "hmacsha256" => Ok(AuthScheme::HmacSha256),
            "basic" => Ok(AuthScheme::Basic),
            other => Err(ConnectorError::Authentication(format!(
                "unknown authentication scheme '{other}' (expected 'hmac' or 'basic')"
            ))),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthScheme::HmacSha256 => "hmac",
            AuthScheme::Basic => "basic",
        })
    }
}

/// A random alphanumeric nonce of [`NONCE_LENGTH`] characters.
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Formats a timestamp as an RFC 1123 HTTP date.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Computes the base64 HMAC-SHA256 signature of a request.
///
/// The signed string is the lowercased concatenation of method, nonce, date, content type,
/// path and query, each followed by a newline.
pub fn signature(
    secret_key: &str,
    method: &str,
    nonce: &str,
    date: &str,
    content_type: &str,
    path: &str,
    query: &str,
) -> Result<String, ConnectorError> {
    let message =
        format!("{method}\n{nonce}\n{date}\n{content_type}\n{path}\n{query}\n").to_lowercase();
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| ConnectorError::Authentication(format!("unusable secret key: {e}")))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub fn basic_authorization(credentials: &Credentials) -> String {
    let pair = format!("{}:{}", credentials.access_key(), credentials.secret_key());
    format!("Basic {}", STANDARD.encode(pair))
}

/// Builds the authentication headers for one request.
///
/// `now` and `nonce` are passed in so that signatures are reproducible.
pub fn auth_headers(
    scheme: AuthScheme,
    credentials: &Credentials,
    method: &str,
    path: &str,
    query: &str,
    now: DateTime<Utc>,
    nonce: &str,
) -> Result<Vec<(String, String)>, ConnectorError> {
    let mut headers = vec![
        ("Accept".to_string(), ACCEPT.to_string()),
        ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
    ];
    match scheme {
        AuthScheme::Basic => {
            headers.push(("Authorization".to_string(), basic_authorization(credentials)));
        }
        AuthScheme::HmacSha256 => {
            let date = http_date(now);
            let signature = signature(
                credentials.secret_key(),
                method,
                nonce,
                &date,
                CONTENT_TYPE,
                path,
                query,
            )?;
            headers.push(("Date".to_string(), date));
            headers.push(("On-Nonce".to_string(), nonce.to_string()));
            headers.push((
                "Authorization".to_string(),
                format!("On {}:HmacSHA256:{signature}", credentials.access_key()),
            ));
        }
    }
    Ok(headers)
}
