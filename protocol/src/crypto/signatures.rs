//! # Digital Signatures
//!
//! Verification of signatures that arrive as raw blobs inside transaction
//! fields. The transaction layer never hands typed keys around; it has a
//! `SigningPubKey` blob and a `TxnSignature` blob, and this module turns
//! those into a yes/no answer with a reason.

use thiserror::Error;

use super::keys::{PublicKey, Signature, TxKeypair};

/// Errors during signature operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Sign a message and return the signature bytes.
pub fn sign_to_bytes(keypair: &TxKeypair, message: &[u8]) -> Vec<u8> {
    keypair.sign(message).into_bytes()
}

/// Verify a signature given the wire-form public key and raw signature bytes.
///
/// This is the "I got these bytes off the wire" variant used by the
/// transaction verifier.
pub fn verify_raw(
    public_key_wire: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let public_key =
        PublicKey::from_wire(public_key_wire).map_err(|_| SignatureError::InvalidPublicKey)?;
    if public_key.verify(message, &Signature::from_bytes(signature.to_vec())) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_raw_accepts_valid() {
        let kp = TxKeypair::generate();
        let sig = sign_to_bytes(&kp, b"msg");
        assert_eq!(sig.len(), 64);
        assert!(verify_raw(&kp.public_key().to_wire(), b"msg", &sig).is_ok());
    }

    #[test]
    fn verify_raw_rejects_wrong_message() {
        let kp = TxKeypair::generate();
        let sig = sign_to_bytes(&kp, b"msg");
        assert_eq!(
            verify_raw(&kp.public_key().to_wire(), b"other", &sig),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn verify_raw_rejects_malformed_key() {
        assert_eq!(
            verify_raw(&[0u8; 33], b"msg", &[0u8; 64]),
            Err(SignatureError::InvalidPublicKey)
        );
        assert_eq!(
            verify_raw(&[], b"msg", &[0u8; 64]),
            Err(SignatureError::InvalidPublicKey)
        );
    }
}
