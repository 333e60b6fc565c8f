mod category;
mod file;
mod row;

pub use self::category::Category;
pub use self::file::{Derived, File, NOT_AVAILABLE};
pub(crate) use self::row::{FileRow, now};
