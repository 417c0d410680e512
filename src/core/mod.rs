//! Core value types shared by the resolver and the heap model.

pub mod address;
pub mod memo;

pub use address::{Address, AddressWidth};
pub use memo::{Memoized, MemoizedBool};
