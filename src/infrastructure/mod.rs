pub mod crypto;

pub use crypto::{ApiToken, CryptoError, TokenCipher};
