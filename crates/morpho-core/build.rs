fn main() {
    // Validate the embedded settings TOML at compile time.
    println!("cargo:rerun-if-changed=src/default_settings.toml");
    let content = include_str!("src/default_settings.toml");
    let value: toml::Value = match content.parse() {
        Ok(v) => v,
        Err(e) => panic!("src/default_settings.toml contains invalid TOML: {e}"),
    };
    for section in ["builder", "nbest", "marginal", "unknown"] {
        if value.get(section).is_none() {
            panic!("src/default_settings.toml is missing [{section}]");
        }
    }
}
