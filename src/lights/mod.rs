pub mod diffuse;
pub mod point;
pub mod infinite;
