//! BIP-340 Schnorr keys over secp256k1.

use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use super::nip19;
use crate::error::{QuoteError, Result};

/// Signing key pair for outgoing replies
pub struct Keys {
    secret: SigningKey,
}

impl Keys {
    pub fn generate() -> Self {
        Self {
            secret: SigningKey::random(&mut OsRng),
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret = SigningKey::from_bytes(bytes)
            .map_err(|e| QuoteError::Decode(format!("Invalid secret key: {}", e)))?;
        Ok(Self { secret })
    }

    /// Parse `nsec1…` (bech32) or 64 hex characters
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        // hex never starts with 'n'; anything else is a bech32 identifier
        if s.starts_with('n') {
            let secret = nip19::decode(s)?.into_secret_key()?;
            return Self::from_secret_bytes(&secret);
        }
        let bytes = hex::decode(s)
            .map_err(|e| QuoteError::Decode(format!("Invalid secret key hex: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    /// x-only public key, lowercase hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.secret.verifying_key().to_bytes())
    }

    /// Sign a 32-byte event id
    pub fn sign(&self, id: &[u8; 32]) -> Result<[u8; 64]> {
        let aux: [u8; 32] = rand::random();
        let signature = self
            .secret
            .sign_raw(id, &aux)
            .map_err(|e| QuoteError::Encode(format!("Signing failed: {}", e)))?;
        Ok(signature.to_bytes())
    }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keys")
            .field("public", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Verify a hex signature over `msg` for an x-only hex public key
pub fn verify(pubkey_hex: &str, msg: &[u8; 32], sig_hex: &str) -> bool {
    let (Ok(pubkey), Ok(sig)) = (hex::decode(pubkey_hex), hex::decode(sig_hex)) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&pubkey) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(sig.as_slice()) else {
        return false;
    };
    key.verify_raw(msg, &signature).is_ok()
}
