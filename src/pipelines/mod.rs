pub mod light;
pub mod program;
