pub mod blog;
pub mod shared;
