mod domain;
pub use domain::{DEFAULT_BUFFER_SIZE, DEFAULT_GENERATOR_NAME, Step};

mod error;
pub use error::{ModelError, ModelResult};

mod spec;
pub use spec::GeneratorSpec;
