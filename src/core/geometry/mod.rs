pub mod vector;
pub mod point;
pub mod normal;
pub mod bounds;
pub mod ray;
pub mod geometry;
