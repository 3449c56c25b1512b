//! Dashboard domain logic
//!
//! - `query` - node listing filters and their PuppetDB query
//! - `stream` - fault-tolerant record streams and chunked page output
//! - `facts` - fact name index

pub mod facts;
pub mod query;
pub mod stream;

pub use facts::group_by_initial;
pub use query::{FilterCriteria, StatusFilter};
pub use stream::{YieldOrStop, chunked_flush, page_fragments};
