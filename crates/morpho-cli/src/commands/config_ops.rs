use std::fs;
use std::process;

use morpho_core::settings::{default_toml, init_custom, parse_settings_toml, Settings};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn settings_export() {
    print!("{}", default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(parse_settings_toml(&content), "Error: {}");
    println!("{}", summary(&s));
}

/// Install a custom settings file for the rest of the process.
pub fn settings_load(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(init_custom(content), "Error loading settings: {}");
}

fn summary(s: &Settings) -> String {
    format!(
        "OK: builder.greedy_threshold={}, nbest.default_n={}, marginal.theta={}",
        s.builder.greedy_threshold, s.nbest.default_n, s.marginal.theta
    )
}
