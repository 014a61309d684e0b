//! User directory for Twinfix.
//!
//! Users report issues, pick them up as technicians, or administer the
//! tracker. Issues reference users through denormalised
//! [`Actor`](crate::issue::domain::Actor) values, so the directory is never
//! consulted on the lifecycle hot path.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
