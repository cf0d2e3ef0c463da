pub mod hash;
pub mod text;
