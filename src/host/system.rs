use std::path::PathBuf;

use crate::config::{Config, ToolsConfig};
use crate::error::PassError;
use crate::parse::{LSBLK_ARGS, ZPOOL_STATUS_ARGS};

use super::ByIdLink;

/// Runs the real host tools.
pub struct SystemHost {
    tools: ToolsConfig,
    by_id_dir: PathBuf,
}

impl SystemHost {
    pub fn new(config: &Config) -> Self {
        Self {
            tools: config.tools.clone(),
            by_id_dir: config.by_id_dir().to_path_buf(),
        }
    }
}

impl super::Host for SystemHost {
    async fn lsblk(&self) -> Result<String, PassError> {
        run(&self.tools.lsblk, LSBLK_ARGS).await
    }

    async fn zpool_status(&self) -> Result<String, PassError> {
        run(&self.tools.zpool, ZPOOL_STATUS_ARGS).await
    }

    async fn qm_list(&self) -> Result<String, PassError> {
        run(&self.tools.qm, &["list"]).await
    }

    async fn qm_config(&self, vmid: u32) -> Result<String, PassError> {
        let vmid = vmid.to_string();
        run(&self.tools.qm, &["config", vmid.as_str()]).await
    }

    async fn by_id_links(&self) -> Result<Vec<ByIdLink>, PassError> {
        let dir = &self.by_id_dir;
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "by-id directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(PassError::Io {
                    context: format!("reading {}", dir.display()),
                    source: e,
                });
            }
        };

        let mut links = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| PassError::Io {
                context: format!("reading {}", dir.display()),
                source: e,
            })?;
            let Some(entry) = entry else { break };

            let is_link = entry
                .file_type()
                .await
                .map(|t| t.is_symlink())
                .unwrap_or(false);
            if !is_link {
                continue;
            }
            let Ok(target) = tokio::fs::read_link(entry.path()).await else {
                continue;
            };
            let Some(target) = target.file_name().and_then(|f| f.to_str()) else {
                continue;
            };
            let Some(alias) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            links.push(ByIdLink {
                alias,
                target: target.to_string(),
            });
        }

        links.sort_by(|a, b| a.alias.cmp(&b.alias));
        tracing::debug!(dir = %dir.display(), count = links.len(), "read by-id links");
        Ok(links)
    }
}

/// Run a tool to completion and return its stdout.
async fn run(program: &str, args: &[&str]) -> Result<String, PassError> {
    let command_line = if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    };
    tracing::debug!(command = %command_line, "running");

    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PassError::CommandNotFound {
                command: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => PassError::PermissionDenied {
                command: command_line.clone(),
                message: e.to_string(),
            },
            _ => PassError::Io {
                context: format!("running {command_line}"),
                source: e,
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        return Err(classify_failure(command_line, message));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn classify_failure(command: String, message: String) -> PassError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("permission denied")
        || lower.contains("must be root")
        || lower.contains("only root")
    {
        PassError::PermissionDenied { command, message }
    } else {
        PassError::ExternalCommand { command, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;

    fn host_with_by_id(dir: &std::path::Path) -> SystemHost {
        let mut config = Config::default();
        config.devices.by_id_dir = dir.display().to_string();
        SystemHost::new(&config)
    }

    #[test]
    fn permission_errors_are_classified() {
        let err = classify_failure(
            "qm list".into(),
            "ipcc_send_rec[1] failed: Permission denied".into(),
        );
        assert!(matches!(err, PassError::PermissionDenied { .. }));

        let err = classify_failure("qm config 7".into(), "VM 7 does not exist".into());
        assert!(matches!(err, PassError::ExternalCommand { .. }));
    }

    #[tokio::test]
    async fn missing_tool_is_not_found() {
        let err = run("/nonexistent/pvpass-tool", &["list"]).await.unwrap_err();
        assert!(matches!(err, PassError::CommandNotFound { .. }));
    }

    #[tokio::test]
    async fn failing_tool_reports_stderr() {
        let err = run("sh", &["-c", "echo boom >&2; exit 3"]).await.unwrap_err();
        match err {
            PassError::ExternalCommand { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn by_id_links_read_symlinks_only() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("../../sdb", dir.path().join("wwn-0x5000c500a1b2c3d4")).unwrap();
        std::os::unix::fs::symlink("../../sdb1", dir.path().join("wwn-0x5000c500a1b2c3d4-part1"))
            .unwrap();
        std::fs::write(dir.path().join("not-a-link"), b"").unwrap();

        let links = host_with_by_id(dir.path()).by_id_links().await.unwrap();
        assert_eq!(
            links,
            vec![
                ByIdLink {
                    alias: "wwn-0x5000c500a1b2c3d4".into(),
                    target: "sdb".into(),
                },
                ByIdLink {
                    alias: "wwn-0x5000c500a1b2c3d4-part1".into(),
                    target: "sdb1".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn missing_by_id_dir_yields_no_links() {
        let dir = tempfile::tempdir().unwrap();
        let links = host_with_by_id(&dir.path().join("absent"))
            .by_id_links()
            .await
            .unwrap();
        assert!(links.is_empty());
    }
}
