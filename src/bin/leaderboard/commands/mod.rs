pub mod server;
pub mod submit;
pub mod token;
pub mod top;
pub mod versions;
