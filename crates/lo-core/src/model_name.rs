//! Strongly-typed model name.

use crate::newtype_string::define_name_type;

define_name_type! {
    /// A non-empty model name.
    ///
    /// Prevents accidental mixing of model names with explore or dimension
    /// names.
    pub struct ModelName;
}

#[cfg(test)]
#[path = "model_name_test.rs"]
mod tests;
