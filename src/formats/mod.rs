//! Binary format parsers.

pub mod elf;
