//! Jira API 令牌的对称加密
//!
//! 密文格式为 `enc:v1:{nonce}:{ciphertext}`，两段都使用无填充的 URL 安全 base64。

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use thiserror::Error;
use uuid::Uuid;

const ENVELOPE_PREFIX: &str = "enc:v1:";
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption key must be 32 bytes encoded as base64")]
    InvalidKey,
    #[error("stored secret envelope is invalid")]
    InvalidEnvelope,
    #[error("failed to encrypt secret")]
    Encrypt,
    #[error("failed to decrypt secret: wrong key or corrupted data")]
    Decrypt,
}

/// 明文 API 令牌，只在构造 Jira 请求时暴露
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; 32],
}

impl fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenCipher(***)")
    }
}

impl TokenCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// 接受标准或 URL 安全的 base64 编码
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let encoded = encoded.trim();
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded.as_bytes())
            .or_else(|_| STANDARD.decode(encoded.as_bytes()))
            .map_err(|_| CryptoError::InvalidKey)?;
        let key: [u8; 32] = decoded.try_into().map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self::new(key))
    }

    pub fn encrypt(&self, token: &ApiToken) -> Result<String, CryptoError> {
        let nonce_source = Uuid::new_v4().as_bytes().to_owned();
        let nonce = Nonce::from_slice(&nonce_source[..NONCE_LEN]);
        let aead = ChaCha20Poly1305::new_from_slice(&self.key).map_err(|_| CryptoError::InvalidKey)?;
        let ciphertext = aead
            .encrypt(nonce, token.expose().as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let nonce_b64 = URL_SAFE_NO_PAD.encode(&nonce_source[..NONCE_LEN]);
        let ciphertext_b64 = URL_SAFE_NO_PAD.encode(ciphertext);
        Ok(format!("{ENVELOPE_PREFIX}{nonce_b64}:{ciphertext_b64}"))
    }

    pub fn decrypt(&self, stored: &str) -> Result<ApiToken, CryptoError> {
        let body = stored
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or(CryptoError::InvalidEnvelope)?;
        let (nonce_b64, ciphertext_b64) = body.split_once(':').ok_or(CryptoError::InvalidEnvelope)?;

        let nonce_raw = URL_SAFE_NO_PAD
            .decode(nonce_b64.as_bytes())
            .map_err(|_| CryptoError::InvalidEnvelope)?;
        if nonce_raw.len() != NONCE_LEN {
            return Err(CryptoError::InvalidEnvelope);
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(ciphertext_b64.as_bytes())
            .map_err(|_| CryptoError::InvalidEnvelope)?;

        let aead = ChaCha20Poly1305::new_from_slice(&self.key).map_err(|_| CryptoError::InvalidKey)?;
        let plaintext = aead
            .decrypt(Nonce::from_slice(&nonce_raw), ciphertext.as_ref())
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plaintext)
            .map(ApiToken)
            .map_err(|_| CryptoError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypts_into_envelope_and_back() {
        let cipher = TokenCipher::new([7u8; 32]);
        let token = ApiToken::new("ATATT3xFfGF0-secret");

        let stored = cipher.encrypt(&token).unwrap();
        assert!(stored.starts_with("enc:v1:"));
        assert!(!stored.contains("ATATT3xFfGF0"));
        assert_eq!(cipher.decrypt(&stored).unwrap(), token);
    }

    #[test]
    fn same_token_gets_fresh_nonce() {
        let cipher = TokenCipher::new([7u8; 32]);
        let token = ApiToken::new("abc");
        assert_ne!(cipher.encrypt(&token).unwrap(), cipher.encrypt(&token).unwrap());
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let stored = TokenCipher::new([7u8; 32])
            .encrypt(&ApiToken::new("abc"))
            .unwrap();
        let err = TokenCipher::new([8u8; 32]).decrypt(&stored).unwrap_err();
        assert!(matches!(err, CryptoError::Decrypt));
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        let cipher = TokenCipher::new([7u8; 32]);
        assert!(matches!(
            cipher.decrypt("plain-token"),
            Err(CryptoError::InvalidEnvelope)
        ));
        assert!(matches!(
            cipher.decrypt("enc:v1:AAAA:BBBB"),
            Err(CryptoError::InvalidEnvelope)
        ));
    }

    #[test]
    fn key_must_be_32_bytes() {
        assert!(TokenCipher::from_base64("BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=").is_ok());
        assert!(matches!(
            TokenCipher::from_base64("c2hvcnQ="),
            Err(CryptoError::InvalidKey)
        ));
    }

    #[test]
    fn debug_never_prints_token() {
        let token = ApiToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "ApiToken(***)");
    }
}
