//! # rent-client
//!
//! Client side of the rent-cart marketplace: session handling, cached
//! catalog reads and the reserve-then-pay flow.
//!
//! ```text
//! Marketplace
//!   ├── SessionStore ──────────── bearer token (memory or file)
//!   ├── ApiClient ─────────────── reqwest, one per marketplace
//!   │     ├── AuthApi             /auth/*
//!   │     ├── CatalogReader       /items/, /categories/   (TTL cached)
//!   │     ├── RentalService       /rentals/*              (TTL cached)
//!   │     ├── PaymentService      /payments/create-intent
//!   │     └── UploadApi           /upload/
//!   ├── ReservationOrchestrator   rental → payment intent
//!   └── PaymentConfirmation       handshake secret → PaymentProcessor
//! ```

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod confirmation;
pub mod http;
pub mod marketplace;
pub mod payments;
pub mod rentals;
pub mod reservation;
pub mod session;
pub mod upload;

pub use auth::AuthApi;
pub use catalog::CatalogReader;
pub use config::ClientConfig;
pub use confirmation::{ConfirmationDialog, PaymentConfirmation};
pub use http::{ApiClient, Auth};
pub use marketplace::Marketplace;
pub use payments::PaymentService;
pub use rentals::RentalService;
pub use reservation::ReservationOrchestrator;
pub use session::{
    BearerToken, FileTokenStore, MemoryTokenStore, SessionState, SessionStore, TokenStore,
};
pub use upload::{UploadApi, UploadedFile};
