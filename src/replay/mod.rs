pub mod rdb;
pub mod rdbx;

pub use rdb::Rdb;
pub use rdbx::Rdbx;
