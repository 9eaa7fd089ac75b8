pub mod config_reader;
pub mod config_writer;
pub mod lexer;
pub mod literal;
pub mod story_config;
pub mod validation;

pub use config_reader::*;
pub use config_writer::*;
pub use literal::*;
pub use story_config::*;
pub use validation::*;
