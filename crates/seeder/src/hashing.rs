//! Password hashing for seeded users.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rayon::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::data::SeedUser;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
    #[error("Failed to build hashing pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("Hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A user ready for insertion, with the password replaced by its hash.
#[derive(Debug, Clone)]
pub struct HashedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl HashedUser {
    pub fn from_seed(user: &SeedUser) -> Result<Self, HashError> {
        Ok(Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: hash_password(&user.password)?,
        })
    }
}

/// Hashes a password with Argon2 default parameters and a random salt.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| HashError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, HashError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| HashError::InvalidHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hashes every user's password on a dedicated pool of `workers` threads.
///
/// Runs on the blocking thread pool so the async runtime keeps serving requests.
/// Output order matches input order.
pub async fn hash_users(users: &[SeedUser], workers: usize) -> Result<Vec<HashedUser>, HashError> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let users = users.to_vec();
    tokio::task::spawn_blocking(move || -> Result<Vec<HashedUser>, HashError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()?;
        pool.install(|| users.par_iter().map(HashedUser::from_seed).collect())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, password: &str) -> SeedUser {
        SeedUser {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_hash_never_equals_plaintext() {
        let hash = hash_password("123456").unwrap();

        assert_ne!(hash, "123456");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("123456", &hash).unwrap());
        assert!(!verify_password("654321", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("x", "plaintext"),
            Err(HashError::InvalidHash(_))
        ));
    }

    #[tokio::test]
    async fn test_hash_users_preserves_order() {
        let users = vec![
            user("a@example.com", "alpha-pass"),
            user("b@example.com", "bravo-pass"),
            user("c@example.com", "charlie-pass"),
        ];

        let hashed = hash_users(&users, 2).await.unwrap();

        assert_eq!(hashed.len(), 3);
        for (seed, hashed) in users.iter().zip(&hashed) {
            assert_eq!(seed.id, hashed.id);
            assert_eq!(seed.email, hashed.email);
            assert!(verify_password(&seed.password, &hashed.password_hash).unwrap());
        }
    }
}
