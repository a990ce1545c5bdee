//! # Prelude
//!
//! Contains definitions that are useful to
//! have global
//!
//! ## Examples
//!
//! ```
//! use ancestrat_core::prelude::*;
//! ```

pub use crate::newtypes::*;
pub use crate::tables::*;
pub use crate::trees::*;
