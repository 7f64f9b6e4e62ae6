pub mod architectures;
pub mod config_cmd;
pub mod run;
