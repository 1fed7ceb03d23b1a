//! Data access: a generic repository over sea-orm entities and the unit of
//! work that flushes what the repositories stage.

mod change_set;
pub mod error;
pub mod repository;
pub mod unit_of_work;

pub use change_set::Pending;
pub use error::DataError;
pub use repository::{Repository, Tracked};
pub use unit_of_work::UnitOfWork;
