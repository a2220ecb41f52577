//! Request summaries and usage records

mod formatter;
mod request_log;
mod usage;

pub use formatter::*;
pub use request_log::*;
pub use usage::*;
