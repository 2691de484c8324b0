// Core analysis for callscope: pure functions over parsed Python source.

pub mod callgraph;
pub mod calltree;
pub mod entry_point;
pub mod resolve;
pub mod segment;
pub mod snippet;
pub mod source;
pub mod syntax;
pub mod walker;
