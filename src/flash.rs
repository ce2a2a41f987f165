//! One-time status messages carried across a redirect in a signed cookie.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const FLASH_COOKIE: &str = "todo_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }
}

/// Signs and verifies flash payloads with HMAC-SHA256 over the configured secret.
#[derive(Clone)]
pub struct FlashSigner {
    secret_key: Vec<u8>,
}

impl std::fmt::Debug for FlashSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashSigner").finish_non_exhaustive()
    }
}

impl FlashSigner {
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Encodes as `base64url(json) "." base64url(mac)`.
    pub fn encode(&self, messages: &[FlashMessage]) -> String {
        // serializing a Vec of plain structs cannot fail
        let payload = serde_json::to_vec(messages).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = self.mac(payload.as_bytes()).finalize().into_bytes();
        let signature = URL_SAFE_NO_PAD.encode(signature);
        format!("{payload}.{signature}")
    }

    /// Returns `None` for malformed, tampered or foreign-key values.
    pub fn decode(&self, value: &str) -> Option<Vec<FlashMessage>> {
        let (payload, signature) = value.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.mac(payload.as_bytes()).verify_slice(&signature).ok()?;
        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&payload).ok()
    }

    fn mac(&self, message: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC accepts any key length");
        mac.update(message);
        mac
    }
}

pub fn set_cookie(value: &str) -> String {
    format!("{FLASH_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Finds the flash cookie across all `Cookie` request headers.
pub fn read_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn encode_decode_with_same_secret() {
        let signer = FlashSigner::new("dev");
        let messages = vec![FlashMessage::success("Task added.")];

        let encoded = signer.encode(&messages);

        assert_eq!(signer.decode(&encoded), Some(messages));
    }

    #[test]
    fn decode_rejects_tampered_payload() {
        let signer = FlashSigner::new("dev");
        let encoded = signer.encode(&[FlashMessage::error("Title is required.")]);
        let (_, signature) = encoded.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&[FlashMessage::success("Task added.")]).unwrap(),
        );

        assert!(signer.decode(&format!("{forged_payload}.{signature}")).is_none());
        assert!(signer.decode("no-dot-here").is_none());
        assert!(signer.decode("").is_none());
    }

    #[test]
    fn decode_rejects_other_secret() {
        let encoded = FlashSigner::new("one").encode(&[FlashMessage::success("ok")]);

        assert!(FlashSigner::new("two").decode(&encoded).is_none());
    }

    #[test]
    fn read_cookie_finds_flash_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            COOKIE,
            HeaderValue::from_static("lang=en; todo_flash=abc.def; other=1"),
        );

        assert_eq!(read_cookie(&headers), Some("abc.def"));
    }

    #[test]
    fn read_cookie_ignores_cleared_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("todo_flash="));

        assert_eq!(read_cookie(&headers), None);
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert!(clear_cookie().contains("Max-Age=0"));
        assert!(set_cookie("v").starts_with("todo_flash=v;"));
    }
}
