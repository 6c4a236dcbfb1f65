//! nCore torrent source.
//!
//! nCore is a private Hungarian tracker. Listings come from its JSON search
//! endpoint; download links and seeding obligations are scraped from HTML.

mod categories;
mod html;
mod page;
mod session;
mod source;

pub use categories::*;
pub use source::{NcoreSource, LOGIN_FAILED_MESSAGE};
