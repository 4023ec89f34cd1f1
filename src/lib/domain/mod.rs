pub mod error;
pub mod id;
pub mod todo;
pub mod validation;

pub use error::*;
pub use id::*;
pub use todo::*;
