//! One-shot flash messages carried in a signed cookie.
//!
//! Cookie value: `<percent-encoded message>.<hex HMAC-SHA256>`

use axum::http::{header, HeaderMap, HeaderValue};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const FLASH_COOKIE: &str = "reelpress_flash";

/// Browsers drop cookies past 4096 bytes; stay under that with the attributes.
const MAX_COOKIE_BYTES: usize = 4000;

#[derive(Clone)]
pub struct FlashSigner {
    key: Vec<u8>,
}

impl FlashSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }

    /// Cookie value for `message`.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.mac();
        mac.update(message.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("{}.{}", urlencoding::encode(message), signature)
    }

    /// Message inside a cookie value, if the signature checks out.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (encoded, signature) = value.rsplit_once('.')?;
        let message = urlencoding::decode(encoded).ok()?.into_owned();
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(message.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(message)
    }

    fn cookie(&self, message: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            FLASH_COOKIE,
            self.sign(message)
        )
    }

    /// `Set-Cookie` value carrying `message`, cut short at a char boundary
    /// if the encoded cookie would not fit in `MAX_COOKIE_BYTES`.
    pub fn set_cookie(&self, message: &str) -> HeaderValue {
        let mut message = message;
        let mut cookie = self.cookie(message);
        while cookie.len() > MAX_COOKIE_BYTES {
            let overflow = cookie.len() - MAX_COOKIE_BYTES;
            // Percent-encoding takes at most 3 bytes per source byte.
            let mut cut = message.len().saturating_sub(overflow.div_ceil(3));
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message = &message[..cut];
            cookie = self.cookie(message);
        }
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_cookie())
    }

    /// Verified flash message from the request's cookies.
    pub fn take(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == FLASH_COOKIE)
            .and_then(|(_, value)| self.verify(value))
    }
}

/// `Set-Cookie` value that expires the flash cookie.
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("reelpress_flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = FlashSigner::new("secret");
        let value = signer.sign("FFmpeg failed: a.b; c=d");
        assert_eq!(signer.verify(&value).as_deref(), Some("FFmpeg failed: a.b; c=d"));
    }

    #[test]
    fn test_rejects_tampering() {
        let signer = FlashSigner::new("secret");
        let value = signer.sign("File type not allowed.");
        let (_, signature) = value.rsplit_once('.').unwrap();

        assert!(signer.verify(&format!("Hacked.{}", signature)).is_none());
        assert!(FlashSigner::new("other").verify(&value).is_none());
        assert!(signer.verify("no-signature").is_none());
    }

    #[test]
    fn test_long_message_fits_in_cookie() {
        let signer = FlashSigner::new("secret");
        let message = format!("FFmpeg failed: {}", "タイトル".repeat(250));

        let cookie = signer.set_cookie(&message);
        assert!(cookie.len() <= MAX_COOKIE_BYTES, "{}", cookie.len());

        let value = cookie.to_str().unwrap();
        let pair = value.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());

        let kept = signer.take(&headers).unwrap();
        assert!(kept.starts_with("FFmpeg failed: タイトル"));
        assert!(message.starts_with(&kept));

        let short = signer.set_cookie("Please upload a file.");
        assert!(short.to_str().unwrap().contains("Please%20upload"));
    }

    #[test]
    fn test_take_from_cookie_header() {
        let signer = FlashSigner::new("secret");
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; {}={}", FLASH_COOKIE, signer.sign("Please upload a file."));
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        assert_eq!(signer.take(&headers).as_deref(), Some("Please upload a file."));
        assert!(signer.take(&HeaderMap::new()).is_none());
    }
}
