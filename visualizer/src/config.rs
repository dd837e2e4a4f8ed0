use anyhow::Context;
use clap::Parser;
use racecore::control::{Endpoint, PageQuery, Variant};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Live race-control dashboard")]
pub struct Args {
    /// Load dashboard settings from YAML
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Dashboard link carrying `target` and `secret` query parameters
    #[arg(long)]
    pub link: Option<String>,
    /// Base URL of the race-control server
    #[arg(long)]
    pub target: Option<String>,
    #[arg(long)]
    pub secret: Option<String>,
    /// primary or simplified
    #[arg(long)]
    pub variant: Option<Variant>,
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Abandon requests that take longer than this
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Send penalties as soon as they are picked, without the reason dialog
    #[arg(long, default_value_t = false)]
    pub no_confirm: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub target: Option<String>,
    pub secret: Option<String>,
    pub variant: Variant,
    /// Defaults to the variant's cadence.
    pub poll_interval_ms: Option<u64>,
    /// Unset means requests may hang indefinitely.
    pub request_timeout_ms: Option<u64>,
    pub confirm_penalties: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            target: None,
            secret: None,
            variant: Variant::Primary,
            poll_interval_ms: None,
            request_timeout_ms: None,
            confirm_penalties: true,
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading dashboard config {}", path_ref.display()))?;
        let config: DashboardConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing dashboard config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Layers file, link query and explicit flags, later sources winning.
    pub fn resolve(args: Args) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(link) = &args.link {
            let query =
                PageQuery::parse(link).with_context(|| format!("reading dashboard link {link}"))?;
            config.target = query.target.or(config.target);
            config.secret = query.secret.or(config.secret);
        }

        if let Some(target) = args.target {
            config.target = Some(target);
        }
        if let Some(secret) = args.secret {
            config.secret = Some(secret);
        }
        if let Some(variant) = args.variant {
            config.variant = variant;
        }
        if let Some(interval) = args.interval_ms {
            config.poll_interval_ms = Some(interval);
        }
        if let Some(timeout) = args.timeout_ms {
            config.request_timeout_ms = Some(timeout);
        }
        if args.no_confirm {
            config.confirm_penalties = false;
        }
        Ok(config)
    }

    pub fn endpoint(&self) -> anyhow::Result<Endpoint> {
        let target = self
            .target
            .as_deref()
            .unwrap_or(Variant::DEFAULT_TARGET);
        Endpoint::new(target, self.secret.clone(), self.variant)
            .with_context(|| format!("configuring race-control endpoint {target}"))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map(|millis| Duration::from_millis(millis.max(50)))
            .unwrap_or_else(|| self.variant.default_poll_interval())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_follow_the_primary_variant() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.poll_interval(), Duration::from_millis(500));
        assert!(cfg.confirm_penalties);
        assert!(cfg.request_timeout().is_none());
        assert!(cfg.endpoint().is_err());
    }

    #[test]
    fn simplified_variant_needs_no_secret() {
        let cfg = DashboardConfig {
            variant: Variant::Simplified,
            ..Default::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1000));
        let endpoint = cfg.endpoint().unwrap();
        assert_eq!(
            endpoint.status_url().unwrap().as_str(),
            "http://localhost:8080/status"
        );
    }

    #[test]
    fn link_query_overrides_file_and_flags_override_link() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"target: http://file.local\nsecret: from-file\nrequest_timeout_ms: 2000\n")
            .unwrap();
        let path = temp.into_temp_path();

        let args = Args {
            config: Some(path.to_path_buf()),
            link: Some("http://dash.local/?target=http://link.local:8080&secret=from-link".into()),
            secret: Some("from-flag".into()),
            ..Default::default()
        };
        let cfg = DashboardConfig::resolve(args).unwrap();
        assert_eq!(cfg.target.as_deref(), Some("http://link.local:8080"));
        assert_eq!(cfg.secret.as_deref(), Some("from-flag"));
        assert_eq!(cfg.request_timeout(), Some(Duration::from_millis(2000)));
        assert_eq!(
            cfg.endpoint().unwrap().status_url().unwrap().as_str(),
            "http://link.local:8080/status/from-flag"
        );
    }

    #[test]
    fn no_confirm_flag_disables_dialog() {
        let args = Args {
            no_confirm: true,
            variant: Some(Variant::Simplified),
            interval_ms: Some(10),
            ..Default::default()
        };
        let cfg = DashboardConfig::resolve(args).unwrap();
        assert!(!cfg.confirm_penalties);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn config_load_reads_variant() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"variant: simplified\nconfirm_penalties: false\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.variant, Variant::Simplified);
        assert!(!cfg.confirm_penalties);
    }
}
