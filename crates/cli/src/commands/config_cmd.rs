//! `harkaam config`: print the default configuration.

use harkaam_config::AppConfig;

pub fn run() {
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    print!("{}", AppConfig::default_toml());
}
