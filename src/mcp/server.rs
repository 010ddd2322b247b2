//! Valuation MCP Server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use rag_imobiliar::search::vectordb::PropertyStore;
use rag_imobiliar::{
    Comparable, Config, Estimation, FilterExtractor, Filters, KeywordFilterExtractor, Pipeline,
    PipelineInput,
};

/// Parameters for property_estimate tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EstimateParams {
    /// Listing description (e.g., "apartament 2 camere Titan 60000 euro")
    #[schemars(description = "Free-text listing query")]
    pub query: String,
    #[schemars(description = "Number of comparables (default from config, capped by max_k)")]
    #[serde(default)]
    pub k: Option<usize>,
    #[schemars(description = "Listed price in EUR, used for the verdict")]
    #[serde(default)]
    pub target_price_eur: Option<f64>,
    #[schemars(description = "Listing area in sqm (default: mean comparable area)")]
    #[serde(default)]
    pub target_sqm: Option<f64>,
}

/// Parameters for extract_filters tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FiltersParams {
    #[schemars(description = "Free-text listing query")]
    pub query: String,
}

#[derive(Debug, Serialize)]
struct EstimateJson {
    filters: Filters,
    comparables: Vec<Comparable>,
    estimation: Estimation,
}

#[derive(Debug, Serialize)]
struct ErrorJson {
    error: &'static str,
    message: String,
}

/// Valuation MCP Service
///
/// The pipeline (and with it the catalog) is loaded on the first estimate
/// and reused for the rest of the session.
#[derive(Clone)]
pub struct ValuationService {
    config: Config,
    pipeline: Arc<Mutex<Option<Pipeline>>>,
    tool_router: ToolRouter<Self>,
}

impl ValuationService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pipeline: Arc::new(Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    fn load_pipeline(&self) -> Result<Pipeline, McpError> {
        if !self.config.storage.db_path.exists() {
            return Err(McpError::internal_error(
                format!(
                    "Index not found at {}. Run `imobiliar index <listings.json>` first.",
                    self.config.storage.db_path.display()
                ),
                None,
            ));
        }
        let pipeline = Pipeline::from_config(&self.config).map_err(|e| {
            McpError::internal_error(format!("Failed to open index: {}", e), None)
        })?;
        tracing::info!(properties = pipeline.catalog().len(), "catalog loaded for session");
        Ok(pipeline)
    }

    /// Run `f` against the session pipeline, loading it on first use
    fn with_pipeline<T>(&self, f: impl FnOnce(&Pipeline) -> T) -> Result<T, McpError> {
        let mut slot = self
            .pipeline
            .lock()
            .map_err(|_| McpError::internal_error("Pipeline lock poisoned", None))?;
        if slot.is_none() {
            *slot = Some(self.load_pipeline()?);
        }
        match slot.as_ref() {
            Some(pipeline) => Ok(f(pipeline)),
            None => Err(McpError::internal_error("Pipeline unavailable", None)),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })
}

#[tool_router]
impl ValuationService {
    #[tool(description = "Estimate the fair price of a real-estate listing from semantically similar comparables. Returns the ranked comparables, the fair price with a ±5% band, and an UNDERPRICED/FAIR/OVERPRICED verdict when a listed price is given.")]
    async fn property_estimate(
        &self,
        params: Parameters<EstimateParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let k = self.config.retrieval.clamp_k(params.k);
        let input = PipelineInput::new(params.query.as_str(), k)
            .with_target_price(params.target_price_eur)
            .with_target_sqm(params.target_sqm);

        let result = self.with_pipeline(|pipeline| {
            pipeline.run(&input).map(|output| EstimateJson {
                filters: pipeline.extract_filters(&params.query),
                comparables: output.comparables,
                estimation: output.estimation,
            })
        })?;

        match result {
            Ok(estimate) => Ok(CallToolResult::success(vec![Content::text(to_json(&estimate)?)])),
            Err(e) => {
                tracing::warn!(error = %e, "property_estimate failed");
                let json = to_json(&ErrorJson {
                    error: e.code(),
                    message: e.to_string(),
                })?;
                Ok(CallToolResult::error(vec![Content::text(json)]))
            }
        }
    }

    #[tool(description = "Parse a listing query into structured filters: property type, rooms, maximum price and neighborhood.")]
    async fn extract_filters(
        &self,
        params: Parameters<FiltersParams>,
    ) -> Result<CallToolResult, McpError> {
        let extractor = KeywordFilterExtractor::with_gazetteer(&self.config.filters.neighborhoods);
        let json = to_json(&extractor.extract(&params.0.query))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get property index statistics: indexed properties, embeddings and last indexing time.")]
    async fn index_status(&self) -> Result<CallToolResult, McpError> {
        let db_path = &self.config.storage.db_path;
        let status = if db_path.exists() {
            let store = PropertyStore::open(db_path).map_err(|e| {
                McpError::internal_error(format!("Failed to open index: {}", e), None)
            })?;
            let stats = store.get_stats().map_err(|e| {
                McpError::internal_error(format!("Failed to read stats: {}", e), None)
            })?;
            serde_json::json!({
                "exists": true,
                "property_count": stats.property_count,
                "embedding_count": stats.embedding_count,
                "last_indexed": stats.last_indexed,
            })
        } else {
            serde_json::json!({ "exists": false })
        };

        Ok(CallToolResult::success(vec![Content::text(to_json(&status)?)]))
    }
}

#[tool_handler]
impl ServerHandler for ValuationService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Real-estate valuation MCP Server. Estimates fair prices for listings from retrieved comparables.".to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server
pub async fn run_mcp_server(config: Config) -> Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!(db = %config.storage.db_path.display(), "starting MCP server");
    let service = ValuationService::new(config);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
