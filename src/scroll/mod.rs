//! Scroll module
//!
//! Viewport-driven triggering for paginated lists.
//!
//! # Overview
//!
//! - [`InfiniteScroll`] asks a [`LoadSource`] for the next page when the
//!   user nears the bottom, either from scroll events checked against a
//!   pixel threshold or from a sentinel becoming visible
//! - In scroll mode it also keeps loading while the content is too short
//!   to scroll at all, so short first pages do not leave the list stuck
//! - [`Viewport`] abstracts the geometry of the window or a scroll container

mod driver;
mod types;

pub use driver::InfiniteScroll;
pub use types::{Attachment, LoadSource, ScrollOptions, TriggerMode, Viewport};

#[cfg(test)]
mod tests;
