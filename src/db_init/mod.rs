//! One-shot initializer that enables pgvector in the document database

pub mod handler;
pub mod postgres;

pub use handler::{DbInitDeps, ensure_vector_extension, function_handler as handler};
pub use postgres::{ConnectParams, PostgresConnector, SchemaConnector, SchemaSession};
