pub mod alert;
pub mod error;
pub mod stats;
pub mod types;

pub use alert::*;
pub use error::*;
pub use types::*;
