//! # Storefront
//!
//! Cart, order lifecycle and access gate of a small storefront with an owner/admin back office,
//! built on the [`collection_actor`] framework.
//!
//! ## Components
//!
//! - **[identity_actor]**: resolves sessions from the identity provider into an identity and role.
//! - **[gate]**: decides which views the current session may enter.
//! - **[cart_actor]**: the per-session cart, partitioned by identity and persisted to slots.
//! - **[order_manager]**: places orders from cart snapshots, streams and mutates them.
//! - **[document_actor]**: the in-process `orders` and `users` collections.
//! - **[clients]**: typed, rule-checked access to those collections.
//! - **[lifecycle]**: wiring, startup, shutdown and tracing setup.
//!
//! ## Flow
//!
//! ```text
//! identity provider ──► IdentityResolver ──► AuthState (watch)
//!                                               │        │
//!                                    AccessGate ◄┘        └► CartStore (partition)
//!                                                              │ snapshot
//!                                                              ▼
//!                                 orders collection ◄──── OrderManager ──► OrderFeed
//! ```

pub mod cart_actor;
pub mod clients;
pub mod config;
pub mod document_actor;
pub mod gate;
pub mod identity_actor;
pub mod lifecycle;
pub mod model;
pub mod notice;
pub mod order_manager;
