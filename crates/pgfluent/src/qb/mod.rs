//! Query building: clause accumulation, operator allow-list, payload
//! records, and statement compilation.

mod builder;
mod op;
mod param;
mod record;
pub(crate) mod statement;

pub use builder::{Page, QueryBuilder};
pub use op::Op;
pub use param::{Param, ParamList};
pub use record::Record;
pub use statement::SortDir;
