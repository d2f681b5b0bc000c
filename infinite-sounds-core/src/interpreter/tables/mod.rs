//! The domain rule tables, one module per rewrite pass.

pub mod audio_piping;
pub mod functions;
pub mod list_ops;
pub mod math_ops;
pub mod music;
pub mod random;
