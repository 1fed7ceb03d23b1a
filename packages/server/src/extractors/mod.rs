pub mod antiforgery;
pub mod json;
pub mod unit_of_work;
