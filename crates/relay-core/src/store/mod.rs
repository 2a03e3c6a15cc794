//! In-memory stores shared by the request handlers
//!
//! Both stores are cheap to clone (the clones share state) and live for the
//! lifetime of the process. Nothing is persisted.

mod allow_list;
mod replies;

pub use allow_list::AllowList;
pub use replies::ReplyStore;
