//! HTTP request handlers, grouped per resource.

pub mod downloads;
pub mod records;
pub mod upload;
