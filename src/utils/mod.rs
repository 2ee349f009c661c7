pub mod error;

pub use error::ClsError;
