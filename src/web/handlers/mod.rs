pub mod info;
pub mod submit;
