pub mod chaining;
pub mod cursor_pagination;
pub mod odata_pagination;
pub mod simple_incrementing;
pub mod snapshot_pagination;

pub use chaining::Chaining;
pub use cursor_pagination::CursorPagination;
pub use odata_pagination::{ODataPagination, ODataTokenMode};
pub use simple_incrementing::SimpleIncrementing;
pub use snapshot_pagination::SnapshotPagination;
