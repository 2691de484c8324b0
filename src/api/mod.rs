// JSON-line TCP API over the analysis operations.

pub mod dto;
pub mod server;
