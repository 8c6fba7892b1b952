// Data access layer
pub mod db {
    pub use crate::db::*;
}

pub mod db_storage {
    pub use crate::db_storage::*;
}
