pub mod structs;

pub use structs::TtlCache;
