pub mod events;
pub mod processes;

pub use events::EventNameTable;
pub use processes::{PathResolver, ProcessNameTable, SysinfoResolver};
