//! Tamer: pet inventory mirroring over an intercepted game protocol

pub mod capture;
pub mod replay;
