//! bioRxiv scrapers.
//!
//! The crawl runs in two phases, each in its own submodule:
//!
//! 1. **Indexing** ([`listing`]): walk the paginated "recent articles"
//!    listing and collect every article URL
//! 2. **Extraction** ([`journal`]): open each article and derive the journal
//!    it was published in from the citation banner
//!
//! Both phases are driven through a [`Driver`](crate::driver::Driver) and
//! depend on the site's markup:
//!
//! | Class | Used by | Meaning |
//! |-------|---------|---------|
//! | `pager-last` | [`listing`] | label holding the number of listing pages |
//! | `highwire-cite-linked-title` | [`listing`] | article title links |
//! | `pub_jnl` | [`journal`] | "Now published in ... doi: ..." banner |

pub mod journal;
pub mod listing;
