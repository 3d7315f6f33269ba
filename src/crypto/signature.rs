use ethers::types::{Address, Signature};
use ethers::utils::hash_message;

/// Verifies EIP-191 personal-message signatures over 32-byte intent digests.
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Recovers the signer of `digest` (signed as a personal message).
    /// Malformed signatures yield `None`.
    pub fn recover(digest: &[u8; 32], signature: &[u8]) -> Option<Address> {
        let signature = Signature::try_from(signature).ok()?;
        signature.recover(hash_message(digest)).ok()
    }

    /// True iff `signature` over `digest` was produced by `actor`.
    /// Never panics; anything malformed is simply `false`.
    pub fn verify(actor: Address, digest: &[u8; 32], signature: &[u8]) -> bool {
        match Self::recover(digest, signature) {
            Some(recovered) => recovered == actor,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::keccak256;
    use crate::models::intent::parse_address;
    use ethers::signers::{LocalWallet, Signer};

    // private key 0x...01
    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const KEY_ONE_ADDRESS: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    fn wallet() -> LocalWallet {
        KEY_ONE.parse().expect("valid key")
    }

    async fn signed(digest: &[u8; 32]) -> Vec<u8> {
        wallet()
            .sign_message(digest)
            .await
            .expect("signing works")
            .to_vec()
    }

    #[tokio::test]
    async fn verify_accepts_matching_signer() {
        let digest = keccak256(b"move");
        let sig = signed(&digest).await;
        assert_eq!(sig.len(), 65);
        assert!(SignatureVerifier::verify(wallet().address(), &digest, &sig));
        assert_eq!(
            SignatureVerifier::recover(&digest, &sig),
            Some(parse_address(KEY_ONE_ADDRESS).expect("valid address"))
        );
    }

    #[tokio::test]
    async fn verify_rejects_other_actor() {
        let digest = keccak256(b"move");
        let sig = signed(&digest).await;
        assert!(!SignatureVerifier::verify(Address::zero(), &digest, &sig));
    }

    #[tokio::test]
    async fn any_signature_byte_flip_fails() {
        let digest = keccak256(b"set-name");
        let sig = signed(&digest).await;
        let actor = wallet().address();
        for idx in 0..sig.len() {
            let mut tampered = sig.clone();
            tampered[idx] ^= 0x01;
            assert!(
                !SignatureVerifier::verify(actor, &digest, &tampered),
                "flip at byte {idx} still verified"
            );
        }
    }

    #[tokio::test]
    async fn any_digest_byte_flip_fails() {
        let digest = keccak256(b"kick");
        let sig = signed(&digest).await;
        let actor = wallet().address();
        for idx in 0..digest.len() {
            let mut tampered = digest;
            tampered[idx] ^= 0x80;
            assert!(!SignatureVerifier::verify(actor, &tampered, &sig));
        }
    }

    #[test]
    fn malformed_signatures_return_false() {
        let digest = keccak256(b"x");
        let actor = Address::zero();
        assert!(!SignatureVerifier::verify(actor, &digest, &[]));
        assert!(!SignatureVerifier::verify(actor, &digest, &[0u8; 64]));
        assert!(!SignatureVerifier::verify(actor, &digest, &[0u8; 65]));
        assert!(!SignatureVerifier::verify(actor, &digest, &[0xffu8; 65]));
    }
}
