//! CLI runner - executes commands

use crate::catalog::{discover, select_streams, Catalog, StreamCatalog};
use crate::cli::commands::{parse_stream_list, Cli, Commands};
use crate::config::TapConfig;
use crate::engine::{SyncEngine, SyncPlan, SyncSettings};
use crate::error::{Error, Result, ResultExt};
use crate::merchant::{MerchantApi, TradeTrackerClient};
use crate::output::JsonLinesWriter;
use crate::state::StateManager;
use std::io::Write;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Discover => self.discover(),
            Commands::Check => self.check().await,
            Commands::Sync { streams } => self.sync(streams.as_deref()).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -C flag)"))?;
        TapConfig::from_file(path)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Load the input catalog, if one was given
    fn load_catalog(&self) -> Result<Option<Catalog>> {
        self.cli.catalog.as_ref().map(Catalog::from_file).transpose()
    }

    /// Print the catalog
    fn discover(&self) -> Result<()> {
        info!("Starting discover");
        let catalog = discover(&StreamCatalog::builtin()?)?;
        let json = serde_json::to_string_pretty(&catalog)?;

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")
            .and_then(|()| stdout.flush())
            .context("Failed to write catalog")?;

        info!("Finished discover");
        Ok(())
    }

    /// Check credentials
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = TradeTrackerClient::open(&config)?;

        info!("Checking connection to {}", config.endpoint());
        let result = client.authenticate().await;
        client.close();
        result?;

        info!("Connection check succeeded");
        Ok(())
    }

    /// Sync selected streams
    async fn sync(&self, streams: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let settings = SyncSettings::from_config(&config)?;
        let state = self.load_state()?;

        let streams_catalog = StreamCatalog::builtin()?;
        let input_catalog = self.load_catalog()?;
        let filter = streams.map(parse_stream_list);
        let selected = select_streams(
            &streams_catalog,
            input_catalog.as_ref(),
            filter.as_deref(),
        )?;
        let mut plan = SyncPlan::new(&streams_catalog, &selected)?;
        if let Some(input) = &input_catalog {
            plan = plan.with_field_selection(input);
        }
        info!("Sync Streams: {:?}", plan.sync_streams());
        if state.is_in_memory() {
            info!("State is not persisted to a file");
        }

        let client = TradeTrackerClient::open(&config)?;
        let result = Self::run_sync(&client, &streams_catalog, state, settings, &plan).await;
        client.close();
        result
    }

    async fn run_sync(
        client: &TradeTrackerClient,
        catalog: &StreamCatalog,
        state: StateManager,
        settings: SyncSettings,
        plan: &SyncPlan,
    ) -> Result<()> {
        client.authenticate().await?;

        let mut writer = JsonLinesWriter::stdout();
        let mut engine = SyncEngine::new(client, catalog, state, settings);
        let stats = engine.run(plan, &mut writer).await?;

        info!(
            "Wrote {} messages, {} records",
            writer.messages_written(),
            stats.records_synced
        );
        Ok(())
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("command", &self.cli.command)
            .finish_non_exhaustive()
    }
}
