pub mod app;
pub mod config;
pub mod derive;
pub mod difflog;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gprofiler;
pub mod hgnc;
pub mod io;
pub mod mygene;
pub mod output;
pub mod resolver;
pub mod store;
pub mod table;
pub mod uniprot;
