use serde::Deserialize;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GatewayCfg {
    #[serde(default)]
    pub http: HttpCfg,
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub ingest: IngestCfg,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct HttpCfg {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Shared secret devices must send as `apikey`. Unset or empty disables
    /// the check.
    #[serde(default)]
    pub apikey: Option<String>,
    /// How long to keep serving (with /readyz at 503) after a shutdown signal.
    #[serde(default)]
    pub shutdown_grace_ms: u64,
}
impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            apikey: None,
            shutdown_grace_ms: 0,
        }
    }
}

impl HttpCfg {
    /// The configured credential, if authentication is enabled.
    pub fn credential(&self) -> Option<&str> {
        self.apikey.as_deref().filter(|k| !k.is_empty())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct StoreCfg {
    pub url: String,
    pub database: String,
    pub measurement: String,
    /// Transport timeout for store requests. None leaves it to the client.
    pub timeout_ms: Option<u64>,
}
impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8086".into(),
            database: "emoncms".into(),
            measurement: "emoncms".into(),
            timeout_ms: None,
        }
    }
}

impl StoreCfg {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct IngestCfg {
    pub max_payload_bytes: usize,
}
impl Default for IngestCfg {
    fn default() -> Self {
        Self {
            max_payload_bytes: 65536,
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080)
}

/// Values given on the command line. They win over files and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub http_bind: Option<String>,
    pub apikey: Option<String>,
    pub store_url: Option<String>,
    pub database: Option<String>,
    pub measurement: Option<String>,
}

impl GatewayCfg {
    pub fn load(path: Option<String>) -> anyhow::Result<Self> {
        Self::load_with(path, &Overrides::default())
    }

    pub fn load_with(path: Option<String>, overrides: &Overrides) -> anyhow::Result<Self> {
        let cfg = Self::from_builder(build_config(path, overrides)?)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.store.url.is_empty(), "store.url cannot be empty");
        anyhow::ensure!(
            !self.store.database.is_empty(),
            "store.database cannot be empty"
        );
        anyhow::ensure!(
            !self.store.measurement.is_empty(),
            "store.measurement cannot be empty"
        );
        anyhow::ensure!(
            self.ingest.max_payload_bytes > 0,
            "ingest.max_payload_bytes must be positive"
        );
        Ok(())
    }

    fn from_builder(cfg: config::Config) -> anyhow::Result<Self> {
        Ok(cfg.try_deserialize()?)
    }
}

fn build_config(path: Option<String>, overrides: &Overrides) -> anyhow::Result<config::Config> {
    use config::{Config, Environment, File};
    let mut builder = Config::builder().add_source(File::with_name("gateway").required(false));
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(&path));
    }
    builder = builder
        .add_source(Environment::with_prefix("GATEWAY").separator("__"))
        .set_override_option("http.bind", overrides.http_bind.clone())?
        .set_override_option("http.apikey", overrides.apikey.clone())?
        .set_override_option("store.url", overrides.store_url.clone())?
        .set_override_option("store.database", overrides.database.clone())?
        .set_override_option("store.measurement", overrides.measurement.clone())?;
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};
    use tempfile::tempdir;

    #[test]
    fn loads_from_config_file_in_cwd() {
        let dir = tempdir().expect("failed to create temp dir for test");
        let toml = r#"
            [http]
            bind = "127.0.0.1:9999"
        "#;
        fs::write(dir.path().join("gateway.toml"), toml).unwrap();

        let old_cwd = env::current_dir().unwrap();
        env::set_current_dir(dir.path()).unwrap();

        let cfg = GatewayCfg::load(None);
        env::set_current_dir(old_cwd).unwrap();
        let cfg = cfg.expect("config file should load");

        assert_eq!(
            cfg.http.bind,
            "127.0.0.1:9999".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(cfg.store.database, "emoncms");
    }

    #[test]
    fn explicit_file_sets_store_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
            [http]
            apikey = "secret"

            [store]
            url = "http://influx:8086"
            database = "energy"
            measurement = "power"
            timeout_ms = 1500
        "#,
        )
        .unwrap();

        let cfg = GatewayCfg::load(Some(path.to_string_lossy().into_owned())).unwrap();

        assert_eq!(cfg.http.credential(), Some("secret"));
        assert_eq!(cfg.store.url, "http://influx:8086");
        assert_eq!(cfg.store.database, "energy");
        assert_eq!(cfg.store.measurement, "power");
        assert_eq!(cfg.store.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
            [store]
            database = "energy"
        "#,
        )
        .unwrap();

        let overrides = Overrides {
            database: Some("override".into()),
            apikey: Some("k".into()),
            ..Default::default()
        };
        let cfg =
            GatewayCfg::load_with(Some(path.to_string_lossy().into_owned()), &overrides).unwrap();

        assert_eq!(cfg.store.database, "override");
        assert_eq!(cfg.http.credential(), Some("k"));
    }

    #[test]
    fn empty_apikey_means_open_mode() {
        let http = HttpCfg {
            apikey: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(http.credential(), None);
        assert_eq!(HttpCfg::default().credential(), None);
    }

    #[test]
    fn rejects_empty_measurement() {
        let mut cfg = GatewayCfg::default();
        cfg.store.measurement.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("store.measurement"));
    }

    #[test]
    fn unknown_store_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(
            &path,
            r#"
            [store]
            bucket = "nope"
        "#,
        )
        .unwrap();

        assert!(GatewayCfg::load(Some(path.to_string_lossy().into_owned())).is_err());
    }
}
