//! `harkaam architectures`: list the reasoning architectures.

use harkaam_agent::Architecture;

pub fn run() {
    println!("Available architectures:\n");
    for arch in Architecture::ALL {
        println!("  {:<8} {:<6} {}", arch.as_str(), arch.title(), arch.description());
    }
    println!("\nUsage: harkaam run <architecture> \"<task>\"");
}
