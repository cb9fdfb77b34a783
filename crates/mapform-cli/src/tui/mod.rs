//! Terminal user interface (TUI) for mapform.
//!
//! Provides the interactive board for one project: drag pages and layer
//! stacks to reorder, rename inline, and watch optimistic sync settle.
//!
//! ## Entry points
//!
//! - [`board::run_board`] — interactive project board.

pub mod board;
