pub mod arena;
pub mod camera;
pub mod ids;
pub mod viewport;

// Foundation crate: small, well-tested primitives only.
pub use arena::*;
pub use camera::*;
pub use ids::*;
pub use viewport::*;
