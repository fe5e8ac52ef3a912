pub mod board_layout;
pub mod board_text;
pub mod command_line;
pub mod display;
pub mod theme;
pub mod view_models;

pub use board_layout::{BoardLayout, Orientation};
pub use board_text::{BoardTextOptions, render_board};
pub use command_line::CommandLine;
pub use view_models::{BoardAppearance, MovePairDisplay, Notice, NoticeKind};
