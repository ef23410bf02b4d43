//! Exit codes for the fanin CLI. Part of the public contract.

pub const SUCCESS: i32 = 0;
pub const TREE_FAILED: i32 = 1; // Root settled by failure, or branches recorded errors
pub const INTERNAL_ERROR: i32 = 2; // Bad config, invalid arguments, walk never settled
