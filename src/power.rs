pub use rfconversions::power::{db_to_linear, linear_to_db};
