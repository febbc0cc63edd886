use std::path::PathBuf;

/// Default config file: `~/.config/pvpass/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("pvpass")
        .join("config.toml")
}
