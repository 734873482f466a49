//! HMAC-SHA512 signing of peer payloads
//!
//! The signature covers `payload || nonce` and travels as lower-case hex in
//! the `x-hmac-auth` header, the nonce in `x-hmac-nonce`.

use hmac::{Hmac, Mac};
use memdb_core::{from_hex, to_hex, Error, Result};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the hex signature
pub const SIGNATURE_HEADER: &str = "x-hmac-auth";

/// Header carrying the nonce
pub const NONCE_HEADER: &str = "x-hmac-nonce";

/// Signs and verifies peer payloads with the cluster's shared secret
#[derive(Clone)]
pub struct MessageSigner {
    secret: Vec<u8>,
}

impl MessageSigner {
    /// Signer over `secret`
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, payload: &[u8], nonce: &[u8]) -> Result<HmacSha512> {
        let mut mac = HmacSha512::new_from_slice(&self.secret)
            .map_err(|e| Error::replication(format!("invalid HMAC key: {}", e)))?;
        mac.update(payload);
        mac.update(nonce);
        Ok(mac)
    }

    /// Hex HMAC of `payload || nonce`
    pub fn sign(&self, payload: &[u8], nonce: &[u8]) -> Result<String> {
        Ok(to_hex(&self.mac(payload, nonce)?.finalize().into_bytes()))
    }

    /// Constant-time check of a hex `signature` over `payload || nonce`
    pub fn verify(&self, payload: &[u8], nonce: &[u8], signature: &str) -> bool {
        if nonce.is_empty() {
            return false;
        }
        let Some(expected) = from_hex(signature) else {
            return false;
        };
        match self.mac(payload, nonce) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for MessageSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_deterministic_hex() {
        let signer = MessageSigner::new("secret");
        let a = signer.sign(b"{}", b"nonce-1").unwrap();
        assert_eq!(a.len(), 128);
        assert_eq!(a, signer.sign(b"{}", b"nonce-1").unwrap());
        assert_ne!(a, signer.sign(b"{}", b"nonce-2").unwrap());
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let signer = MessageSigner::new("Jefe");
        assert_eq!(
            signer.sign(b"what do ya want ", b"for nothing?").unwrap(),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn test_verify() {
        let signer = MessageSigner::new("secret");
        let signature = signer.sign(b"payload", b"n").unwrap();

        assert!(signer.verify(b"payload", b"n", &signature));
        assert!(signer.verify(b"payload", b"n", &signature.to_uppercase()));
        assert!(!signer.verify(b"payload!", b"n", &signature));
        assert!(!signer.verify(b"payload", b"m", &signature));
        assert!(!signer.verify(b"payload", b"", &signature));
        assert!(!signer.verify(b"payload", b"n", "not hex"));
        assert!(!signer.verify(b"payload", b"n", &signature[..64]));
    }

    #[test]
    fn test_different_secrets_disagree() {
        let a = MessageSigner::new("one");
        let b = MessageSigner::new("two");
        let signature = a.sign(b"payload", b"n").unwrap();
        assert!(!b.verify(b"payload", b"n", &signature));
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = MessageSigner::new("hunter2");
        assert!(!format!("{:?}", signer).contains("hunter2"));
    }
}
