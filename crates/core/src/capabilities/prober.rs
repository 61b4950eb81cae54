//! Tool presence probing and best-effort installation.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::process::{CommandRequest, CommandRunner};

use super::config::CapabilitiesConfig;
use super::types::{CapabilityReport, ToolStatus, REQUIRED_TOOLS};

/// Detects which external tools are present and optionally installs the rest.
pub struct CapabilityProber {
    config: CapabilitiesConfig,
    runner: Arc<dyn CommandRunner>,
    last_report: RwLock<CapabilityReport>,
}

impl CapabilityProber {
    pub fn new(config: CapabilitiesConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            last_report: RwLock::new(CapabilityReport::default()),
        }
    }

    /// Probes every required tool, installing missing packages when allowed.
    ///
    /// Never fails: install problems are recorded per tool in the report.
    pub async fn check_and_install_dependencies(&self) -> CapabilityReport {
        let mut tools = Vec::with_capacity(REQUIRED_TOOLS.len());
        for requirement in REQUIRED_TOOLS {
            let available = self.runner.is_available(requirement.tool).await;
            tools.push(ToolStatus::new(requirement, available));
        }

        let mut report = CapabilityReport {
            tools,
            checked_at: None,
            privileged: self.is_privileged().await,
            package_manager_available: self
                .runner
                .is_available(&self.config.package_manager)
                .await,
        };

        let missing = report.missing_packages();
        if !missing.is_empty() {
            if self.config.auto_install && report.privileged && report.package_manager_available {
                self.install_missing(&mut report.tools, &missing).await;
            } else {
                let reason = if !self.config.auto_install {
                    "auto-install disabled".to_string()
                } else if !report.privileged {
                    "auto-install requires root".to_string()
                } else {
                    format!("package manager {} not found", self.config.package_manager)
                };
                warn!(
                    "Missing packages ({}): {}; install them manually",
                    reason,
                    missing.join(", ")
                );
                for status in report.tools.iter_mut().filter(|t| !t.available) {
                    status.install_error = Some(format!(
                        "{}; install manually: sudo {} install -y {}",
                        reason, self.config.package_manager, status.package
                    ));
                }
            }
        }

        report.checked_at = Some(Utc::now());

        let available = report.tools.iter().filter(|t| t.available).count();
        info!(
            "Capability check complete: {}/{} tools available",
            available,
            report.tools.len()
        );

        *self.last_report.write().await = report.clone();
        report
    }

    /// Last computed report (empty before the first check).
    pub async fn dependency_status(&self) -> CapabilityReport {
        self.last_report.read().await.clone()
    }

    async fn is_privileged(&self) -> bool {
        let request = CommandRequest::new("id", ["-u"]).with_timeout(Duration::from_secs(5));
        match self.runner.run(request).await {
            Ok(out) if out.success => out.stdout.trim() == "0",
            _ => false,
        }
    }

    async fn install_missing(&self, tools: &mut [ToolStatus], packages: &[String]) {
        let pm = self.config.package_manager.clone();
        info!("Attempting to install missing packages: {}", packages.join(", "));

        let update = CommandRequest::new(pm.as_str(), ["update"])
            .with_timeout(Duration::from_secs(self.config.update_timeout_secs));
        match self.runner.run(update).await.and_then(|o| o.into_success(&pm)) {
            Ok(_) => info!("Package index updated"),
            Err(e) => warn!("Package index update failed (continuing): {}", e),
        }

        for package in packages {
            let install = CommandRequest::new(pm.as_str(), ["install", "-y", package.as_str()])
                .with_timeout(Duration::from_secs(self.config.install_timeout_secs));
            let outcome = self.runner.run(install).await.and_then(|o| o.into_success(&pm));

            for status in tools.iter_mut().filter(|t| &t.package == package) {
                status.install_attempted = true;
            }

            match outcome {
                Ok(_) => {
                    for status in tools.iter_mut().filter(|t| &t.package == package) {
                        status.available = self.runner.is_available(&status.tool).await;
                        if !status.available {
                            status.install_error =
                                Some(format!("{} installed but {} not found", package, status.tool));
                        }
                    }
                    info!("Installed package {}", package);
                }
                Err(e) => {
                    warn!("Failed to install package {}: {}", package, e);
                    for status in tools.iter_mut().filter(|t| &t.package == package) {
                        status.install_error = Some(e.to_string());
                    }
                }
            }
        }
    }
}
