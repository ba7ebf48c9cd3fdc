//! # checkout-payments
//!
//! The payment-orchestration core: everything between a human-entered wallet
//! address and a settled transfer.
//!
//! ## Negotiation flow
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────┐   ┌────────────┐
//! │  Wallet   │──▶│   Quote    │──▶│ Initiator │──▶│  consent   │
//! │ Resolver  │   │   Engine   │   │ (pending  │   │ (redirect, │
//! └──────────┘   │ (2 grants) │   │  grant)   │   │  external) │
//!                └────────────┘   └───────────┘   └─────┬──────┘
//!                                                       │
//!                ┌────────────┐   ┌───────────┐         │
//!                │  Verifier  │◀──│ Finalizer │◀────────┘
//!                │ (1 fetch)  │   │ (continue │
//!                └────────────┘   │  + create)│
//!                                 └───────────┘
//! ```
//!
//! Every hop can fail: redirects, expiring grants, short-lived quotes. The
//! policy throughout is no retries and fixed user-safe error messages; the
//! only recovery path is restarting the flow from wallet resolution.
//!
//! The card processor path ([`CardClient`]) is an alternate leaf with the same
//! terminal result shape.

mod card;
mod client;
mod error;
mod payment;
mod protocol;
mod quote;

pub use card::{CardClient, CardPaymentIntent};
pub use client::{ClientConfig, OpenPaymentsClient};
pub use error::{PaymentError, Result};
pub use payment::{
    finalize_payment, initiate_payment, verify_payment, IncomingPaymentCompletion,
    OutgoingPaymentHandle, PaymentResult, PendingPayment, ResultColor,
};
pub use protocol::{
    AccessAction, AccessItem, AccessLimits, GrantRequest, IncomingPayment, OutgoingPayment,
    PaymentMetadata,
};
pub use quote::{
    create_request_payment, fetch_quote, fetch_request_quote, quote_incoming_payment,
    request_payment_details, CheckoutQuote, QuotePolicy, RequestQuote,
};
