//! utk-client: session and state sync for the UTK token ledger.
//!
//! # Architecture
//!
//! ```text
//! WalletController (what a UI drives)
//!   │
//!   ├── AuthSession ── IdentityProvider (login / logout / session query)
//!   │     └── ActorProxy (one per identity, swapped whole on change)
//!   │           └── LedgerTransport (remote ledger calls)
//!   │
//!   ├── SyncController (balance, supply, history → WalletState)
//!   │
//!   └── OperationExecutor (mine / send / sell)
//!         ├── Outcome::decode (raw reply → message)
//!         └── resync via SyncController
//! ```
//!
//! Local state is a snapshot of the ledger, never a source of truth: the
//! executor never writes balance, supply or history; only a fetch does.
//!
//! # Features
//!
//! - `native` - CLI binary, signal handling, log subscriber, data dirs
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use utk_client::{ClientConfig, LocalIdentityProvider, LocalLedger, OperationForm, WalletController};
//!
//! let controller = WalletController::new(
//!     ClientConfig::default(),
//!     Arc::new(LocalIdentityProvider::new("passphrase")),
//!     Arc::new(LocalLedger::new()),
//! );
//! controller.init().await;
//! controller.login().await?;
//!
//! let mut form = OperationForm::new("100");
//! controller.mine(&mut form).await;
//! assert_eq!(form.result_message, "Minted 100 UTK");
//! assert_eq!(controller.snapshot().balance(), 100);
//! ```

pub mod actor;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod format;
pub mod identity;
pub mod ledger;
pub mod outcome;
pub mod principal;
pub mod session;
pub mod state;
pub mod sync;

#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod runtime;

pub use actor::ActorProxy;
pub use config::ClientConfig;
pub use controller::WalletController;
pub use error::{ClientError, ClientResult, PrincipalError, TransportError};
pub use executor::{Operation, OperationExecutor, Submission};
pub use identity::{Identity, IdentityProvider, LocalIdentityProvider, LoginOptions};
pub use ledger::{LedgerTransport, LocalLedger, Transaction, TxKind};
pub use outcome::Outcome;
pub use principal::Principal;
pub use session::AuthSession;
pub use state::{AuthPhase, OperationForm, StateHandle, WalletState};
pub use sync::{SyncController, SyncFields};

#[cfg(feature = "native")]
pub use runtime::{install_signal_handlers, Shutdown};
