//! Client for the x_token bonding-curve program: account codecs, address
//! derivation, curve pricing, trade planning and submission, and trade
//! history reconstruction.

pub mod accounts;
pub mod config;
pub mod curve;
pub mod engine;
pub mod history;
pub mod pda;
pub mod verify;
