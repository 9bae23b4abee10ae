// src/secrets/mod.rs
mod identity;
mod key_vault;
mod store;

pub use identity::{IdentityEndpoint, ManagedIdentityCredential};
pub use key_vault::KeyVaultSecretStore;
pub use store::{
    resolve_credentials, CredentialNames, Credentials, SecretError, SecretStore, SecretValue,
};
