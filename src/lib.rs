//! Keyword-driven question answering over telecom billing records

pub mod cli;
pub mod parsers;
pub mod services;
pub mod types;
