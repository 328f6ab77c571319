//! Credential hashing.

use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher,
    PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
    #[error("stored hash is not a valid PHC string")]
    MalformedHash,
    #[error("hashing task did not complete")]
    Join(#[from] tokio::task::JoinError),
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
#[derive(Debug, Clone)]
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: &ArgonConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id with a fresh random salt.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC.
    ///
    /// Parameters stored in the PHC string win over the configured ones.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> Result<bool> {
        let parsed =
            PasswordHash::new(phc_hash).map_err(|_| CryptoError::MalformedHash)?;
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(CryptoError::MalformedHash);
        }

        match self.argon2().verify_password(password.as_ref(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(err) => Err(CryptoError::Argon2(err.to_string())),
        }
    }

    /// Same as [`PasswordManager::hash_password`], off the async executor.
    pub async fn hash(&self, password: String) -> Result<String> {
        let manager = self.clone();
        let password = zeroize::Zeroizing::new(password);

        tokio::task::spawn_blocking(move || manager.hash_password(&*password))
            .await?
    }

    /// Same as [`PasswordManager::verify_password`], off the async executor.
    pub async fn verify(&self, password: String, phc_hash: String) -> Result<bool> {
        let manager = self.clone();
        let password = zeroize::Zeroizing::new(password);

        tokio::task::spawn_blocking(move || {
            manager.verify_password(&*password, &phc_hash)
        })
        .await?
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Cheap parameters, tests do not need to resist offline guessing.
    pub(crate) fn config() -> ArgonConfig {
        ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }
    }

    #[test]
    fn test_hash_is_salted() {
        let pwd = PasswordManager::new(&config()).unwrap();

        let first = pwd.hash_password("p@ss1").unwrap();
        let second = pwd.hash_password("p@ss1").unwrap();

        assert_ne!(first, second);
        assert_ne!(first, "p@ss1");
        assert!(first.starts_with("$argon2id$v=19$"));
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_verify_password() {
        let pwd = PasswordManager::new(&config()).unwrap();
        let hash = pwd.hash_password("p@ss1").unwrap();

        assert!(pwd.verify_password("p@ss1", &hash).unwrap());
        assert!(!pwd.verify_password("p@ss2", &hash).unwrap());
        assert!(!pwd.verify_password("P@ss1", &hash).unwrap());
        assert!(!pwd.verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_with_other_parameters() {
        let old = PasswordManager::new(&config()).unwrap();
        let hash = old.hash_password("p@ss1").unwrap();

        let new = PasswordManager::new(&ArgonConfig {
            iterations: 2,
            ..config()
        })
        .unwrap();
        assert!(new.verify_password("p@ss1", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        let pwd = PasswordManager::new(&config()).unwrap();

        assert!(matches!(
            pwd.verify_password("p@ss1", "p@ss1"),
            Err(CryptoError::MalformedHash)
        ));

        // Valid PHC string with its output segment cut off.
        let hash = pwd.hash_password("p@ss1").unwrap();
        let (truncated, _) = hash.rsplit_once('$').unwrap();
        assert!(matches!(
            pwd.verify_password("p@ss1", truncated),
            Err(CryptoError::MalformedHash)
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let config = ArgonConfig {
            memory_cost: 1,
            ..config()
        };

        assert!(matches!(
            PasswordManager::new(&config),
            Err(CryptoError::Argon2(_))
        ));
    }

    #[tokio::test]
    async fn test_async_roundtrip() {
        let pwd = PasswordManager::new(&config()).unwrap();

        let hash = pwd.hash("p@ss1".to_owned()).await.unwrap();
        assert!(pwd.verify("p@ss1".to_owned(), hash.clone()).await.unwrap());
        assert!(!pwd.verify("wrong".to_owned(), hash).await.unwrap());
    }
}
