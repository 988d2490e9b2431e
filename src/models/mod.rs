pub mod enums;
pub mod persona;
pub mod raw_profile;

pub use enums::*;
pub use persona::*;
pub use raw_profile::*;

use thiserror::Error;

/// A string did not name any variant of a closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct EnumParseError {
    pub field: String,
    pub value: String,
}
