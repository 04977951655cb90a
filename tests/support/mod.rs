#![allow(dead_code)]

pub mod fake_server;
pub mod mouldtrack_env;
pub mod tokens;
