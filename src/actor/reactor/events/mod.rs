pub mod pointer;
pub mod screen;
pub mod window;
