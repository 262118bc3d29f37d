pub mod error;
pub mod types;

#[cfg(feature = "efficiency")]
pub mod efficiency;

#[cfg(feature = "statements")]
pub mod statements;

pub use error::RatioError;
pub use types::*;

/// Standard result type for all fin-ratios operations
pub type RatioResult<T> = Result<T, RatioError>;
