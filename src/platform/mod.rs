//! Player script access and signature resolution for the video platform

pub mod cipher;
pub mod client;
pub mod formats;
pub mod player;

pub use client::*;
pub use formats::*;
pub use player::*;
