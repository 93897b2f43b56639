//! Configuration for a cloud provider
//!
//! The simplest way to configure the provider is [`Config::from_partial`] or,
//! with the "cli" feature turned on, [`Config::from_opts`]. Values come
//! from command line flags (which fall back to environment variables), then
//! from an optional YAML cloud-config file, then from defaults.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use structopt::StructOpt;

/// The provider name, also the scheme of node provider IDs.
pub const DEFAULT_PROVIDER_NAME: &str = "huaweicloud";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The configuration needed to talk to the cloud.
#[derive(Clone, Debug)]
pub struct Config {
    /// The provider name, used as the provider ID scheme
    pub provider_name: String,
    /// Base URL of the regional ECS endpoint
    pub endpoint: String,
    /// The region, if known
    pub region: Option<String>,
    /// The project every request is scoped to
    pub project_id: String,
    /// IAM token used to authenticate, if any
    pub auth_token: Option<String>,
    /// Timeout for a single API request
    pub request_timeout: Duration,
}

/// A partially specified configuration, as read from one source.
///
/// This is also the format of the cloud-config file:
///
/// ```yaml
/// region: cn-north-4
/// project-id: 0605767c2f00d2c92f2ac01f2f8a3e91
/// auth-token: MIIZ...
/// request-timeout: 10
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialConfig {
    /// See [`Config::provider_name`]
    pub provider_name: Option<String>,
    /// See [`Config::endpoint`]
    pub endpoint: Option<String>,
    /// See [`Config::region`]
    pub region: Option<String>,
    /// See [`Config::project_id`]
    pub project_id: Option<String>,
    /// See [`Config::auth_token`]
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    pub request_timeout: Option<u64>,
}

impl PartialConfig {
    /// Read a cloud-config file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("unable to open cloud config {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("unable to parse cloud config {}", path.display()))
    }

    /// Fill every unset value from `other`
    fn or(self, other: PartialConfig) -> PartialConfig {
        PartialConfig {
            provider_name: self.provider_name.or(other.provider_name),
            endpoint: self.endpoint.or(other.endpoint),
            region: self.region.or(other.region),
            project_id: self.project_id.or(other.project_id),
            auth_token: self.auth_token.or(other.auth_token),
            request_timeout: self.request_timeout.or(other.request_timeout),
        }
    }
}

impl Config {
    /// Resolve a config from flags and the cloud-config file, flags winning.
    ///
    /// An endpoint, or a region to derive one from, and a project ID are
    /// required.
    pub fn from_partial(flags: PartialConfig, file: PartialConfig) -> anyhow::Result<Self> {
        let merged = flags.or(file);
        let region = merged.region.filter(|r| !r.is_empty());
        let endpoint = match (merged.endpoint.filter(|e| !e.is_empty()), &region) {
            (Some(endpoint), _) => endpoint,
            (None, Some(region)) => default_endpoint(region),
            (None, None) => anyhow::bail!("an ECS endpoint or a region must be configured"),
        };
        let project_id = merged
            .project_id
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow::anyhow!("a project ID must be configured"))?;

        Ok(Config {
            provider_name: merged
                .provider_name
                .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_owned()),
            endpoint,
            region,
            project_id,
            auth_token: merged.auth_token.filter(|t| !t.is_empty()),
            request_timeout: Duration::from_secs(
                merged
                    .request_timeout
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        })
    }

    /// Build a config from parsed CLI options, reading the cloud-config file
    /// they point at, if any.
    #[cfg(feature = "cli")]
    pub fn from_opts(opts: Opts) -> anyhow::Result<Self> {
        let file = match &opts.cloud_config {
            Some(path) => PartialConfig::from_file(path)?,
            None => PartialConfig::default(),
        };
        Config::from_partial(opts.into_partial(), file)
    }
}

/// CLI options that can be configured for the cloud provider
#[derive(StructOpt, Clone, Debug, Default)]
#[cfg(feature = "cli")]
pub struct Opts {
    #[structopt(
        long = "cloud-config",
        env = "CLOUD_CONFIG",
        help = "The path to a YAML cloud config file. Flags take precedence over its values"
    )]
    cloud_config: Option<PathBuf>,

    #[structopt(
        long = "provider-name",
        env = "CLOUD_PROVIDER_NAME",
        help = "The provider name used as the scheme of node provider IDs. Defaults to huaweicloud"
    )]
    provider_name: Option<String>,

    #[structopt(
        long = "ecs-endpoint",
        env = "ECS_ENDPOINT",
        help = "The ECS endpoint URL. Defaults to the public endpoint of --region"
    )]
    endpoint: Option<String>,

    #[structopt(long = "region", env = "ECS_REGION", help = "The region, e.g. cn-north-4")]
    region: Option<String>,

    #[structopt(
        long = "project-id",
        env = "ECS_PROJECT_ID",
        help = "The project every request is scoped to"
    )]
    project_id: Option<String>,

    #[structopt(
        long = "auth-token",
        env = "ECS_AUTH_TOKEN",
        hide_env_values = true,
        help = "The IAM token to authenticate with"
    )]
    auth_token: Option<String>,

    #[structopt(
        long = "request-timeout",
        env = "ECS_REQUEST_TIMEOUT",
        help = "Timeout in seconds for a single API request. Defaults to 30"
    )]
    request_timeout: Option<u64>,
}

#[cfg(feature = "cli")]
impl Opts {
    fn into_partial(self) -> PartialConfig {
        PartialConfig {
            provider_name: self.provider_name,
            endpoint: self.endpoint,
            region: self.region,
            project_id: self.project_id,
            auth_token: self.auth_token,
            request_timeout: self.request_timeout,
        }
    }
}

fn default_endpoint(region: &str) -> String {
    format!("https://ecs.{}.myhuaweicloud.com", region)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn partial(project_id: Option<&str>, region: Option<&str>) -> PartialConfig {
        PartialConfig {
            project_id: project_id.map(String::from),
            region: region.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let config =
            Config::from_partial(partial(Some("p-1"), Some("cn-north-4")), Default::default())?;
        assert_eq!(DEFAULT_PROVIDER_NAME, config.provider_name);
        assert_eq!("https://ecs.cn-north-4.myhuaweicloud.com", config.endpoint);
        assert_eq!(Duration::from_secs(30), config.request_timeout);
        assert_eq!(None, config.auth_token);
        Ok(())
    }

    #[test]
    fn test_flags_win_over_file() -> anyhow::Result<()> {
        let flags = PartialConfig {
            endpoint: Some("http://127.0.0.1:8080".into()),
            request_timeout: Some(5),
            ..partial(None, None)
        };
        let file = PartialConfig {
            endpoint: Some("https://ecs.example.com".into()),
            auth_token: Some("from-file".into()),
            ..partial(Some("p-file"), Some("cn-north-4"))
        };
        let config = Config::from_partial(flags, file)?;
        assert_eq!("http://127.0.0.1:8080", config.endpoint);
        assert_eq!("p-file", config.project_id);
        assert_eq!(Some("cn-north-4".to_owned()), config.region);
        assert_eq!(Some("from-file".to_owned()), config.auth_token);
        assert_eq!(Duration::from_secs(5), config.request_timeout);
        Ok(())
    }

    #[test]
    fn test_missing_required_values() {
        assert!(Config::from_partial(partial(Some("p-1"), None), Default::default()).is_err());
        assert!(Config::from_partial(partial(None, Some("cn-north-4")), Default::default()).is_err());
        assert!(
            Config::from_partial(partial(Some(""), Some("cn-north-4")), Default::default())
                .is_err()
        );
    }

    #[test]
    fn test_read_cloud_config_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "region: ap-southeast-1\nproject-id: p-yaml\nauth-token: t\nrequest-timeout: 12"
        )?;
        let partial = PartialConfig::from_file(file.path())?;
        assert_eq!(Some("p-yaml".to_owned()), partial.project_id);
        assert_eq!(Some(12), partial.request_timeout);

        let config = Config::from_partial(Default::default(), partial)?;
        assert_eq!("https://ecs.ap-southeast-1.myhuaweicloud.com", config.endpoint);
        Ok(())
    }

    #[test]
    fn test_unknown_cloud_config_keys_are_rejected() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "project-id: p\nsecret-key: oops")?;
        assert!(PartialConfig::from_file(file.path()).is_err());
        Ok(())
    }
}
