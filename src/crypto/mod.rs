pub mod digest;
pub mod hash;
pub mod signature;
