pub mod client;
pub mod mapper;
pub mod types;

pub use client::{HeliusClient, DEFAULT_RPC_URL, WRAPPED_SOL_MINT};
