//! RSA request signing.
//!
//! Signatures are RSASSA-PKCS1-v1_5 over SHA-256, base64-encoded. PKCS#1 v1.5
//! is deterministic, so the same payload always yields the same signature.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use paydesk_core::{PaydeskError, Result};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;

/// Signs request payloads with a fixed private key.
#[derive(Clone)]
pub struct RsaSigner {
    key: SigningKey<Sha256>,
}

impl RsaSigner {
    pub fn new(key: RsaPrivateKey) -> Self {
        Self {
            key: SigningKey::<Sha256>::new(key),
        }
    }

    /// Load a key supplied as PEM text or as base64-encoded DER.
    ///
    /// Both PKCS#8 and PKCS#1 encodings are accepted.
    pub fn from_key_material(material: &str) -> Result<Self> {
        let material = material.trim();
        if material.is_empty() {
            return Err(PaydeskError::Signing("private key is not configured".into()));
        }

        let key = if material.starts_with("-----BEGIN") {
            RsaPrivateKey::from_pkcs8_pem(material)
                .or_else(|_| RsaPrivateKey::from_pkcs1_pem(material))
                .map_err(|e| PaydeskError::Signing(format!("invalid PEM key: {}", e)))?
        } else {
            let compact: String = material.split_whitespace().collect();
            let der = STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| PaydeskError::Signing(format!("key is not valid base64: {}", e)))?;
            RsaPrivateKey::from_pkcs8_der(&der)
                .or_else(|_| RsaPrivateKey::from_pkcs1_der(&der))
                .map_err(|e| PaydeskError::Signing(format!("invalid DER key: {}", e)))?
        };

        Ok(Self::new(key))
    }

    /// Sign the exact bytes that will be sent.
    pub fn sign(&self, payload: &[u8]) -> Result<String> {
        let signature = self
            .key
            .try_sign(payload)
            .map_err(|e| PaydeskError::Signing(e.to_string()))?;
        Ok(STANDARD.encode(signature.to_bytes()))
    }
}

impl fmt::Debug for RsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSigner").finish_non_exhaustive()
    }
}
