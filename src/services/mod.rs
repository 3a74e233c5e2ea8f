pub mod favorites;
pub mod lookup;
pub mod remote_parser;
pub mod status;
