pub mod canvas;
pub mod catalog;
pub mod codec;
pub mod error;
pub mod palette;
