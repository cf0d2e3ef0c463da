pub mod command;
pub mod console;
pub mod menu;
pub mod tray;
pub mod window;
