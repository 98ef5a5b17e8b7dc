// EN: src/core/accounts.rs

use crate::models::Account;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// Authentication-key scheme byte for single Ed25519 keys.
const ED25519_SCHEME: u8 = 0x00;

/// Account generation errors.
#[derive(Error, Debug)]
pub enum AccountError {
    /// The generator could not produce a keypair.
    #[error("Keypair generation failed: {0}")]
    Generation(String),
}

/// Produces fresh keypairs. Implementations may delegate to anything that can mint keys.
pub trait KeypairGenerator: Send + Sync {
    /// Returns a new, unused keypair.
    fn generate_keypair(&self) -> Result<Account, AccountError>;
}

/// Generates Ed25519 keys locally from the OS random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Generator;

impl KeypairGenerator for Ed25519Generator {
    fn generate_keypair(&self) -> Result<Account, AccountError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key().to_bytes();
        Ok(Account {
            address: derive_address(&public_key),
            private_key_hex: format!("0x{}", hex::encode(signing_key.to_bytes())),
            public_key_hex: format!("0x{}", hex::encode(public_key)),
        })
    }
}

/// The account address of a single-key Ed25519 account: `sha3_256(pubkey || scheme)`.
pub fn derive_address(public_key: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Hands out ephemeral sender identities. Keeps no record of what it produced.
pub struct AccountFactory {
    generator: Box<dyn KeypairGenerator>,
}

impl AccountFactory {
    /// A factory backed by a custom generator.
    pub fn new(generator: impl KeypairGenerator + 'static) -> Self {
        Self {
            generator: Box::new(generator),
        }
    }

    /// Mints one new account. Nothing is recorded on chain until it is funded.
    pub fn create_account(&self) -> Result<Account, AccountError> {
        let account = self.generator.generate_keypair()?;
        log::debug!("Generated account {}", account.address);
        Ok(account)
    }
}

impl Default for AccountFactory {
    fn default() -> Self {
        Self::new(Ed25519Generator)
    }
}

impl std::fmt::Debug for AccountFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountFactory").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_account_is_consistent() {
        let account = AccountFactory::default().create_account().unwrap();

        assert!(account.address.starts_with("0x"));
        assert_eq!(account.address.len(), 2 + 64);
        assert_eq!(account.private_key_hex.len(), 2 + 64);
        assert_eq!(account.public_key_hex.len(), 2 + 64);

        // The private key must reproduce the public key, which must reproduce the address.
        let secret: [u8; 32] = hex::decode(&account.private_key_hex[2..])
            .unwrap()
            .try_into()
            .unwrap();
        let public = SigningKey::from_bytes(&secret).verifying_key().to_bytes();
        assert_eq!(account.public_key_hex, format!("0x{}", hex::encode(public)));
        assert_eq!(account.address, derive_address(&public));
    }

    #[test]
    fn test_accounts_are_unique() {
        let factory = AccountFactory::default();
        let a = factory.create_account().unwrap();
        let b = factory.create_account().unwrap();
        assert_ne!(a.address, b.address);
        assert_ne!(a.private_key_hex, b.private_key_hex);
    }

    struct FixedGenerator;

    impl KeypairGenerator for FixedGenerator {
        fn generate_keypair(&self) -> Result<Account, AccountError> {
            Ok(Account {
                address: "0xa11ce".to_string(),
                private_key_hex: "0x01".to_string(),
                public_key_hex: "0x02".to_string(),
            })
        }
    }

    struct BrokenGenerator;

    impl KeypairGenerator for BrokenGenerator {
        fn generate_keypair(&self) -> Result<Account, AccountError> {
            Err(AccountError::Generation("no entropy".to_string()))
        }
    }

    #[test]
    fn test_factory_delegates_to_generator() {
        let account = AccountFactory::new(FixedGenerator).create_account().unwrap();
        assert_eq!(account.address, "0xa11ce");

        let err = AccountFactory::new(BrokenGenerator).create_account().unwrap_err();
        assert!(err.to_string().contains("no entropy"));
    }
}
