pub mod context;
pub mod policy;
pub mod sale_line;
