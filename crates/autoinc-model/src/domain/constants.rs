/// Name used in logs and metric labels when a spec does not set one.
pub const DEFAULT_GENERATOR_NAME: &str = "autoinc";

/// Number of values precomputed ahead of consumption by default.
pub const DEFAULT_BUFFER_SIZE: usize = 1;
