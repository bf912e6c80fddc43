//! Business logic services. Each service owns one slice of the domain and is
//! shared behind an `Arc` by the HTTP handlers.

pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod payments;
pub mod settings;
