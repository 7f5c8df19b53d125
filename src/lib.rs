pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod fixup;
pub mod grid;
pub mod index;
pub mod keys;
pub mod layers;
pub mod mapping;
pub mod package;
pub mod parser;
pub mod rewriter;
pub mod template;
