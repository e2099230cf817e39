pub mod geometry;
pub mod simulated;
pub mod virtual_desktop;
pub mod window_server;
