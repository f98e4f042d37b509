mod generator;
pub use generator::GeneratorSpec;
