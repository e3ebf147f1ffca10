//! Strongly-typed explore name.

use crate::newtype_string::define_name_type;

define_name_type! {
    /// A non-empty explore name.
    pub struct ExploreName;
}
