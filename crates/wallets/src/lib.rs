//! # metaswap-wallets
//!
//! Account sessions, the injected wallet and remote signer surfaces, and the signer that
//! combines them.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod account;
pub mod error;
pub mod injected;
pub mod remote;
pub mod selector;
pub mod session;
pub mod signer;

#[cfg(feature = "browser")]
pub mod wallet_browser;

pub use account::{AccountHandle, AuthContext, Backend};
pub use error::WalletSignerError;
pub use injected::{InjectedProvider, ProviderError, RpcInjectedProvider};
pub use remote::{
    Authenticator, CredentialStamper, RemoteSignerClient, RemoteSignerError,
    RemoteSigningService, StaticStamper,
};
pub use selector::SignerSelector;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionData, SessionStore};
pub use signer::{SignerBackend, WalletSigner};

#[cfg(feature = "browser")]
pub use wallet_browser::{BrowserWallet, server::BrowserWalletServer};
