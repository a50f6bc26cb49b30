//! Type definitions for the validation system

mod email_input;
mod password_input;
mod text_input;
mod username;

pub use email_input::EmailInput;
pub use password_input::PasswordInput;
pub use text_input::{LongTextInput, TextInput};
pub use username::Username;
