pub mod binding;
pub mod builder;
pub mod document;
pub mod html;
pub mod surface;

pub use binding::*;
pub use builder::*;
pub use document::*;
pub use surface::*;
