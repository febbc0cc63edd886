use std::path::Path;

use facet::Facet;

use crate::error::PassError;
use crate::paths;

/// Highest scsi index Proxmox accepts (`scsi0`..`scsi30`).
pub const PROXMOX_MAX_SCSI: u32 = 30;

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct Config {
    #[facet(default)]
    pub tools: ToolsConfig,
    #[facet(default)]
    pub devices: DevicesConfig,
    #[facet(default)]
    pub passthrough: PassthroughConfig,
}

/// Paths (or bare names looked up on `$PATH`) of the host tools.
#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct ToolsConfig {
    #[facet(default = "lsblk")]
    pub lsblk: String,
    #[facet(default = "zpool")]
    pub zpool: String,
    #[facet(default = "qm")]
    pub qm: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            lsblk: "lsblk".into(),
            zpool: "zpool".into(),
            qm: "qm".into(),
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct DevicesConfig {
    #[facet(default = "/dev/disk/by-id")]
    pub by_id_dir: String,
    /// Kernel names never offered for passthrough, e.g. a non-ZFS boot disk.
    #[facet(default)]
    pub exclude: Vec<String>,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            by_id_dir: "/dev/disk/by-id".into(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct PassthroughConfig {
    #[facet(default = 30)]
    pub max_slot: u32,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self {
            max_slot: PROXMOX_MAX_SCSI,
        }
    }
}

impl Config {
    pub fn by_id_dir(&self) -> &Path {
        Path::new(&self.devices.by_id_dir)
    }
}

// ── validation ────────────────────────────────────────────

fn validate_config(config: &Config) -> Result<(), PassError> {
    let tools = [
        ("lsblk", &config.tools.lsblk),
        ("zpool", &config.tools.zpool),
        ("qm", &config.tools.qm),
    ];
    for (key, value) in tools {
        if value.trim().is_empty() {
            return Err(PassError::Validation {
                message: format!("tools.{key} must not be empty"),
            });
        }
    }

    if !config.by_id_dir().is_absolute() {
        return Err(PassError::Validation {
            message: format!(
                "devices.by_id_dir must be absolute (got '{}')",
                config.devices.by_id_dir
            ),
        });
    }

    if config.passthrough.max_slot > PROXMOX_MAX_SCSI {
        return Err(PassError::Validation {
            message: format!(
                "passthrough.max_slot must be at most {PROXMOX_MAX_SCSI} (got {})",
                config.passthrough.max_slot
            ),
        });
    }

    Ok(())
}

// ── public API ────────────────────────────────────────────

/// Parse and validate config text. `path` is only used in error messages.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config, PassError> {
    let config: Config = facet_toml::from_str(contents).map_err(|e| PassError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the config file.
///
/// An explicit path must exist. Without one, the default location is tried
/// and built-in defaults are used when it is absent.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, PassError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default = paths::default_config_path();
            if !default.exists() {
                tracing::debug!(path = %default.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            default
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|source| PassError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;

    let config = parse_config(&contents, &path)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
