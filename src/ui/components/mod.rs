mod category_picker;
mod command_input;
mod input;
mod key_result;
mod search_input;

pub use category_picker::{CategoryEvent, CategoryPicker};
pub use command_input::{CommandEvent, CommandInput};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
