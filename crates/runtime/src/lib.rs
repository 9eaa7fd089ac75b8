pub mod binder;
pub mod edit;
pub mod export;
pub mod options;
pub mod session;

pub use binder::*;
pub use edit::*;
pub use export::*;
pub use options::*;
pub use session::*;
