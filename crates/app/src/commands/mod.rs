pub mod seed;
pub mod status;
pub mod study;
pub mod submit;
