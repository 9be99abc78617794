pub mod amounts;
pub mod error;
pub mod line;
pub mod lookup;
pub mod settings;
pub mod sync;
pub mod types;

#[cfg(feature = "sale_order")]
pub mod sale_order;

#[cfg(feature = "invoice")]
pub mod invoice;

#[cfg(feature = "subscription")]
pub mod subscription;

pub use error::FiscoError;
pub use types::*;

/// Standard result type for all fiscal operations
pub type FiscoResult<T> = Result<T, FiscoError>;
