pub mod base;
pub mod maintenance;
pub mod proxy;

pub use base::{MCPTool, Schema};
pub use maintenance::maintenance_tools;
pub use proxy::{proxy_tools, shortcut_tools, CliHelpTool};
