pub mod optimizer;
pub mod search;
pub mod service;
pub mod swap;
pub mod utility;
