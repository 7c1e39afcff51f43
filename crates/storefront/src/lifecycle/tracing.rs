//! # Tracing
//!
//! [`setup_tracing`] installs the process-wide subscriber: compact lines, no module targets,
//! level filtering through `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run                       # lifecycle and mutations
//! RUST_LOG=debug cargo run                      # plus requests, slot I/O, gate decisions
//! RUST_LOG=storefront::cart_actor=debug cargo run
//! ```
//!
//! Components log with structured fields (`key`, `order_id`, `uid`, `error`), so a line such as
//!
//! ```text
//! WARN Cart load failed, starting empty key=cart_u1 error=Persistence unavailable: ...
//! ```
//!
//! can be filtered on the field rather than the message.

/// Installs the global subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
