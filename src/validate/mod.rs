//! Payload validation against field definitions

mod validator;


pub use validator::*;
