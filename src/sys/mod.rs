pub mod event;
pub mod window_server;
pub mod x11;
