//! Adapters translating the session's effects into user-facing output.

pub mod terminal_view;

pub use terminal_view::TerminalView;
