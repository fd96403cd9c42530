pub mod csv;
pub mod news;
pub mod status;
