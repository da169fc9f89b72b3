//! Output files written by a crawl.
//!
//! # Submodules
//!
//! - [`links`]: the collected link list, written per listing page
//! - [`records`]: the link→journal record file, written per article
//! - [`summary`]: the journal frequency table (stdout) and JSON report
//!
//! # Output Structure
//!
//! ```text
//! myCrawlerLinks.txt     # one article URL per line
//! linkPublishedIn.txt    # <link>\t<journal> per line, input order
//! summary.json           # optional, --summary-json
//! ```

pub mod links;
pub mod records;
pub mod summary;
