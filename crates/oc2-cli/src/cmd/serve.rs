use anyhow::Result;
use oc2_core::config::RelayConfig;
use oc2_core::Relay;
use std::path::Path;
use std::sync::Arc;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub path: Option<String>,
    pub strict: bool,
    pub debug_endpoint: bool,
}

impl Overrides {
    fn apply(self, config: &mut RelayConfig) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(path) = self.path {
            config.path = path;
        }
        config.strict_validation |= self.strict;
        config.debug_endpoint |= self.debug_endpoint;
    }
}

pub fn run(config_path: Option<&Path>, overrides: Overrides) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    overrides.apply(&mut config);
    config.ensure_valid()?;

    let relay = Arc::new(Relay::from_config(&config));
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&config.listen).await?;

        let result = tokio::select! {
            res = oc2_server::serve_on(Arc::clone(&relay), &config, listener) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        };

        tracing::info!(commands = relay.len(), "relay stopped");
        result
    })
}
