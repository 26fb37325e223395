use flags::config::Config as FlagsConfig;
use serde::Deserialize;
use std::fs::File;

fn default_metrics_prefix() -> String {
    "flagsync".to_string()
}

#[derive(Deserialize, Debug)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

#[derive(Deserialize, Debug)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Deserialize, Debug)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub flags: FlagsConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use flags::config::DismissalStoreType;
    use std::io::Write;
    use std::time::Duration;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://public@sentry.example.com/1
            flags:
                remote:
                    url: https://config.example.com/flags.json
                    timeout_secs: 5
                polling:
                    interval_secs: 60
                dismissal_store:
                    type: filesystem
                    path: /var/lib/flagsync/state.json
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "flagsync");
        assert!(config.common.logging.is_some());

        assert_eq!(
            config.flags.remote.url.as_str(),
            "https://config.example.com/flags.json"
        );
        assert_eq!(config.flags.remote.timeout(), Duration::from_secs(5));
        assert_eq!(config.flags.polling.interval(), Duration::from_secs(60));
        assert_eq!(
            config.flags.dismissal_store.r#type,
            DismissalStoreType::Filesystem {
                path: "/var/lib/flagsync/state.json".into()
            }
        );
    }

    #[test]
    fn minimal_config() {
        let yaml = r#"
            flags:
                remote:
                    url: http://localhost:8080/config
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.common.metrics.is_none());
        assert!(config.common.logging.is_none());
        assert_eq!(config.flags.remote.timeout(), Duration::from_secs(10));
        assert_eq!(config.flags.polling.interval(), Duration::from_secs(300));
        assert_eq!(
            config.flags.dismissal_store.r#type,
            DismissalStoreType::Memory
        );
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = Config::from_file(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn missing_flags_section() {
        let tmp = write_tmp_file("metrics:\n    statsd_host: localhost\n    statsd_port: 8125\n");
        let result = Config::from_file(tmp.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
