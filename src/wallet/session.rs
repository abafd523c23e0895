//! Wallet session: provider detection and the authorized account.
//!
//! A `Session` is an explicit value handed to whatever needs a signer.
//! It lives only as long as the process; nothing is persisted.

use alloy::primitives::Address;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::error::EhrError;
use crate::wallet::{WalletError, WalletProvider};

/// Provider presence plus the currently authorized account.
pub struct Session<W> {
    provider: Option<Arc<W>>,
    account: ArcSwapOption<Address>,
}

impl<W: WalletProvider> Session<W> {
    /// Start a session around whatever provider was found, if any.
    pub fn detect(provider: Option<W>) -> Self {
        let provider = provider.map(Arc::new);
        tracing::debug!(present = provider.is_some(), "Wallet provider detection");
        Self {
            provider,
            account: ArcSwapOption::empty(),
        }
    }

    /// Whether a wallet provider is installed.
    pub fn detect_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// The last known authorized account, without contacting the wallet.
    pub fn account(&self) -> Option<Address> {
        self.account.load().as_deref().copied()
    }

    /// Read already-authorized accounts without prompting.
    ///
    /// `Ok(None)` means the wallet authorizes no account. A failed read is
    /// an error and leaves the cached account untouched.
    pub async fn current_account(&self) -> Result<Option<Address>, EhrError> {
        let Some(provider) = self.provider.as_ref() else {
            return Ok(None);
        };
        let accounts = provider.accounts().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read authorized accounts");
            EhrError::WalletUnavailable(e.to_string())
        })?;

        let account = accounts.first().copied();
        self.account.store(account.map(Arc::new));
        Ok(account)
    }

    /// Prompt the wallet for an account.
    pub async fn request_authorization(&self) -> Result<Address, EhrError> {
        let provider = self.provider.as_ref().ok_or(EhrError::NoProviderFound)?;

        let accounts = provider.request_accounts().await.map_err(|e| match e {
            WalletError::UserRejected(what) => EhrError::UserRejected { action: what },
            other => {
                tracing::warn!(error = %other, "Authorization request failed");
                EhrError::SignerUnavailable
            }
        })?;

        let account = accounts.first().copied().ok_or_else(|| {
            tracing::warn!("Wallet authorized no accounts");
            EhrError::SignerUnavailable
        })?;

        self.account.store(Some(Arc::new(account)));
        tracing::info!(account = %account, "Session authorized");
        Ok(account)
    }

    /// Provider and account for signing, if both are available.
    pub fn signer(&self) -> Result<(Arc<W>, Address), EhrError> {
        let provider = self.provider.clone().ok_or(EhrError::NoProviderFound)?;
        let account = self.account().ok_or(EhrError::SignerUnavailable)?;
        Ok((provider, account))
    }
}

impl<W> std::fmt::Debug for Session<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("provider_present", &self.provider.is_some())
            .field("account", &self.account.load().as_deref().copied())
            .finish()
    }
}
