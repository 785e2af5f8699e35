use anyhow::{anyhow, Result};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};

/// Argon2id hasher for per-identity credentials. Every stored credential is a
/// PHC string carrying its own salt and parameters, so verification does not
/// depend on the hasher's current cost settings.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self { Self { params: Params::default() } }
}

impl CredentialHasher {
    /// Minimum-cost parameters. Only suitable for tests.
    pub fn fast_insecure() -> Self {
        // m_cost 8 KiB, t_cost 1, p_cost 1 are the smallest values argon2 accepts
        let params = Params::new(8, 1, 1, None).unwrap_or_default();
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
        let phc = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    pub fn verify(&self, hash: &str, password: &str) -> bool {
        if let Ok(parsed) = PasswordHash::new(hash) {
            self.argon2().verify_password(password.as_bytes(), &parsed).is_ok()
        } else { false }
    }
}
