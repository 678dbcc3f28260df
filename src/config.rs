use serde_derive::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AppConfig {
    pub output: Option<OutputConfig>,
    pub uplink: Option<UplinkConfig>,
}

#[derive(Deserialize, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{data, warnings, errors}` as returned to network servers
    #[default]
    Structured,
    /// `[{field, value}, ...]` as consumed by dashboards
    Flat,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    pub pretty: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct UplinkConfig {
    pub port: Option<u8>,
}

impl AppConfig {
    pub fn format(&self) -> OutputFormat {
        self.output
            .as_ref()
            .and_then(|o| o.format)
            .unwrap_or_default()
    }

    pub fn pretty(&self) -> bool {
        self.output.as_ref().and_then(|o| o.pretty).unwrap_or(false)
    }

    pub fn port(&self) -> u8 {
        self.uplink.as_ref().and_then(|u| u.port).unwrap_or(1)
    }
}
