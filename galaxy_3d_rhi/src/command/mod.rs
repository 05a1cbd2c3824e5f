/// Command module - deferred command recording and submission

pub mod command_buffer;
pub mod command_list_manager;
pub mod command_list;

pub use command_buffer::*;
pub use command_list_manager::*;
pub use command_list::*;
