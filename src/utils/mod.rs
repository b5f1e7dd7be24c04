pub mod clock;
pub mod codes;
pub mod id_generator;
