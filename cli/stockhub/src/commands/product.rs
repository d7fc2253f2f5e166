use anyhow::{Context, Result};
use bpaf::Bpaf;
use stockhub_sdk::providers::catalog::ProductId;
use stockhub_sdk::stockhub::Stockhub;
use tracing::instrument;

use crate::utils::render;

/// Show a product with its reviews and similar products
#[derive(Debug, Bpaf, Clone)]
pub struct ShowProduct {
    /// Print the product as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Id of the product
    #[bpaf(positional("id"))]
    pub id: u64,
}

impl ShowProduct {
    pub fn new(id: ProductId) -> Self {
        Self {
            json: false,
            id: id.0,
        }
    }

    #[instrument(name = "product", skip_all, fields(id = self.id))]
    pub async fn handle(self, stockhub: &Stockhub) -> Result<()> {
        print!("{}", self.render(stockhub, textwrap::termwidth()).await?);
        Ok(())
    }

    async fn render(&self, stockhub: &Stockhub, width: usize) -> Result<String> {
        let detail = stockhub
            .product_detail(ProductId(self.id))
            .await
            .context("Failed to load product")?;

        if self.json {
            return Ok(serde_json::to_string_pretty(&detail)? + "\n");
        }
        Ok(render::product_detail(&detail, width))
    }
}
