pub mod chain;
pub mod entry;
pub mod expression;
pub mod rule;
pub mod statement;
pub mod table;

pub use chain::*;
pub use entry::*;
pub use expression::*;
pub use rule::*;
pub use statement::*;
pub use table::*;

// Object model of the nftables JSON interchange format (`nft -j`)
