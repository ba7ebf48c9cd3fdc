//! # checkout-core
//!
//! Data model and storage traits for the Open Payments checkout.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Payment Attempt                          │
//! │  ┌──────────┐  ┌───────┐  ┌───────┐  ┌──────────────────┐   │
//! │  │  Wallet  │  │ Quote │  │ Grant │  │  PaymentRecord   │   │
//! │  │Descriptor│──│       │──│ Union │──│  (durable)       │   │
//! │  └──────────┘  └───────┘  └───────┘  └──────────────────┘   │
//! │        PaymentSessionState (TTL-bound, per browser)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `SessionStore` and `PaymentRecordStore` traits let the server swap the
//! in-memory stores for a real session backend and database without touching
//! the orchestration logic.

pub mod amount;
pub mod error;
pub mod grant;
pub mod quote;
pub mod record;
pub mod session;
pub mod wallet;

pub use amount::{Amount, FormattedAmount};
pub use error::{CoreError, Result};
pub use grant::{Grant, NonInteractiveGrant, PendingGrant};
pub use quote::Quote;
pub use record::{MemoryPaymentRecordStore, PaymentRecord, PaymentRecordStore};
pub use session::{MemorySessionStore, PaymentSessionState, SessionId, SessionStore};
pub use wallet::{normalize_wallet_pointer, WalletDescriptor};
