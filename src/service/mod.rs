pub mod customer;
pub mod deadline;
pub mod filesystem;
pub mod import;
pub mod parse;
pub mod summary;
