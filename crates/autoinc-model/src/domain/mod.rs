mod constants;
pub use constants::{DEFAULT_BUFFER_SIZE, DEFAULT_GENERATOR_NAME};

mod step;
pub use step::Step;
