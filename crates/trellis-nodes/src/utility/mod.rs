//! Utility nodes

mod debug_print;
mod script;

pub use debug_print::DebugPrintNode;
pub use script::{ScriptNode, ScriptRuntime};
