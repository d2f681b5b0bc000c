pub mod mode;
pub mod note;

pub use mode::Mode;
pub use note::{AbsNote, AlphaNote, Note, RelNote};
