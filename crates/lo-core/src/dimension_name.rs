//! Strongly-typed dimension name.

use crate::newtype_string::define_name_type;

define_name_type! {
    /// A non-empty, fully scoped dimension name (e.g. `orders.created_date`).
    pub struct DimensionName;
}
