//! Polymarket module - Gamma market data and CLOB order placement

pub mod auth;
pub mod client;
pub mod messages;
pub mod rest;

pub use client::PolymarketClient;
pub use rest::PolymarketRestClient;
