//! Wallet sessions and signing identities.
//!
//! A [`WalletSession`] never reaches for ambient state: the provider is
//! injected, and its absence is how "no wallet installed" is modelled.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use std::sync::Arc;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use thiserror::Error;

use crate::observability::metrics;

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PATENT_LEDGER_PRIVATE_KEY";

/// Failure reported by a wallet provider while handing out an account.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The user declined the connection prompt.
    #[error("user rejected the request: {0}")]
    UserRejected(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors surfaced by [`WalletSession`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No signing provider in the environment.
    #[error("no wallet provider available")]
    Unavailable,

    /// The user declined the wallet prompt. Retryable immediately.
    #[error("wallet connection rejected: {0}")]
    UserRejected(String),

    #[error("wallet provider error: {0}")]
    Provider(String),

    /// Invalid private key format or derivation error.
    #[error("Invalid private key format: {0}")]
    InvalidKey(String),
}

/// An account able to authorize ledger writes.
///
/// Identities handed out by external signers carry only the address; those
/// created from a local key also carry the key.
#[derive(Clone)]
pub struct SigningIdentity {
    address: Address,
    signer: Option<PrivateKeySigner>,
}

impl SigningIdentity {
    /// Identity whose signatures are produced elsewhere.
    pub fn address_only(address: Address) -> Self {
        Self {
            address,
            signer: None,
        }
    }

    /// Identity backed by a local private key.
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            signer: Some(signer),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The local signing key, if this identity has one.
    pub fn signer(&self) -> Option<&PrivateKeySigner> {
        self.signer.as_ref()
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .field("local_key", &self.signer.is_some())
            .finish()
    }
}

/// A source of signing identities, e.g. a wallet extension or a local key.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for an account. May suspend on a user approval prompt.
    async fn request_account(&self) -> Result<SigningIdentity, ProviderError>;
}

/// Wallet provider backed by a private key from the environment.
#[derive(Clone)]
pub struct LocalKeyWallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl LocalKeyWallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for EIP-155 replay protection
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> Result<Self, WalletError> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let mut signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| WalletError::InvalidKey(format!("{}", e)))?;
        signer.set_chain_id(Some(chain_id));

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Local wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Load the wallet from `PATENT_LEDGER_PRIVATE_KEY`.
    ///
    /// An unset or blank variable means "no wallet"; a malformed key is an error.
    pub fn detect_from_env(chain_id: u64) -> Result<Option<Self>, WalletError> {
        match std::env::var(PRIVATE_KEY_ENV_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::from_private_key(&key, chain_id).map(Some),
            _ => Ok(None),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl std::fmt::Debug for LocalKeyWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyWallet")
            .field("address", &self.signer.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[async_trait]
impl WalletProvider for LocalKeyWallet {
    async fn request_account(&self) -> Result<SigningIdentity, ProviderError> {
        Ok(SigningIdentity::from_signer(self.signer.clone()))
    }
}

/// Holds the connection to a user-controlled signing identity.
///
/// Account changes made in the wallet after `connect` are not observed; the
/// held identity is kept until `connect` or `disconnect` is called again.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    identity: Option<SigningIdentity>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            provider,
            identity: None,
        }
    }

    /// Whether a provider is present in the environment.
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn identity(&self) -> Option<&SigningIdentity> {
        self.identity.as_ref()
    }

    /// Obtain a signing identity from the provider.
    pub async fn connect(&mut self) -> Result<SigningIdentity, WalletError> {
        let provider = match &self.provider {
            Some(provider) => Arc::clone(provider),
            None => {
                metrics::record_wallet_connection("unavailable");
                return Err(WalletError::Unavailable);
            }
        };

        match provider.request_account().await {
            Ok(identity) => {
                tracing::info!(address = %identity.address(), "Wallet connected");
                metrics::record_wallet_connection("connected");
                self.identity = Some(identity.clone());
                Ok(identity)
            }
            Err(ProviderError::UserRejected(reason)) => {
                tracing::info!(reason = %reason, "Wallet connection declined by user");
                metrics::record_wallet_connection("rejected");
                Err(WalletError::UserRejected(reason))
            }
            Err(ProviderError::Failed(reason)) => {
                tracing::warn!(reason = %reason, "Wallet provider failed");
                metrics::record_wallet_connection("error");
                Err(WalletError::Provider(reason))
            }
        }
    }

    /// Forget the held identity.
    pub fn disconnect(&mut self) {
        self.identity = None;
    }
}
