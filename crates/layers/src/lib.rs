pub mod controller;
pub mod map_options;
pub mod paint;
pub mod recording;

pub use controller::*;
pub use map_options::*;
pub use paint::*;
