//! Website blocking: the navigation guard, the block page and the
//! page-load blocker

pub mod block_page;
pub mod navigation;
pub mod page_blocker;

pub use block_page::{display_host, BlockPage, BlockPageInfo};
pub use navigation::{NavigationEvent, NavigationGuard, NavigationOutcome};
pub use page_blocker::{BlockInterstitial, PageLoadBlocker, PageSurface, PageVerdict};
