use anyhow::{Context, Result};
use bpaf::Bpaf;
use stockhub_sdk::stockhub::Stockhub;
use tracing::instrument;

use crate::utils::render;

/// List product categories
#[derive(Debug, Bpaf, Clone, Default)]
pub struct Catalogue {
    /// Print the categories as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Catalogue {
    #[instrument(name = "catalogue", skip_all)]
    pub async fn handle(self, stockhub: &Stockhub) -> Result<()> {
        print!("{}", self.render(stockhub).await?);
        Ok(())
    }

    async fn render(&self, stockhub: &Stockhub) -> Result<String> {
        let tiles = stockhub
            .catalogue()
            .await
            .context("Failed to load categories")?;

        if self.json {
            return Ok(serde_json::to_string_pretty(&tiles)? + "\n");
        }
        Ok(render::catalogue(&tiles))
    }
}
