//! Parsing and bookkeeping that does not touch processes directly.

pub mod command;
pub mod job;
pub mod tokenizer;
