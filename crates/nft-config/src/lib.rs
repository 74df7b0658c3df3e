pub mod config;
pub mod diff;
pub mod error;
pub mod expr;
pub mod lookup;

pub use config::*;
pub use diff::*;
pub use error::*;
pub use lookup::*;

pub use nft_schema as schema;

// nftables JSON documents: build, encode/decode, and look up elements
