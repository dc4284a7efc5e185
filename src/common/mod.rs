pub mod config;
pub mod desktop;
pub mod distro;
pub mod open;
pub mod paths;
pub mod progress;
pub mod shell;

pub use desktop::DesktopEnvironment;
