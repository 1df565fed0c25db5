//! Farcaster mini-app webhook verification

pub mod neynar;
pub mod signature;

pub use neynar::{HubConfig, HubKeyVerifier};
pub use signature::{JsonSignatureVerifier, SignatureEnvelope, SignatureHeader, BASE64URL};
