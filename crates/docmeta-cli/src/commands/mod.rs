//! Command implementations.

pub mod metadata;
pub mod prepare;
pub mod prompt_upload;

pub use self::metadata::{execute_metadata, token_counter};
pub use self::prepare::execute_prepare;
pub use self::prompt_upload::execute_prompt_upload;
