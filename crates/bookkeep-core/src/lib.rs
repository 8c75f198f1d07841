//! bookkeep-core - Core library for bookkeep
//!
//! Session handling and data access for the accounting backend: persisted
//! tokens, silent refresh, an authenticated REST client that retries once
//! on 401, typed endpoints, and the project ledger aggregation.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod jwt;
pub mod ledger;
pub mod refresher;
pub mod token_store;
pub mod transport;

pub use api::BookkeepApi;
pub use client::AuthenticatedClient;
pub use config::{ClientConfig, ConfigFile};
pub use error::{CoreError, LedgerError, LedgerStep};
pub use event::{ClearReason, SessionEvent, SessionEvents};
pub use ledger::LedgerAggregator;
pub use refresher::{SessionStatus, TokenRefresher};
pub use token_store::{TokenKey, TokenStore};
pub use transport::{HttpTransport, Method, MockReply, MockTransport, Transport};
