//! Application state shared by CLI commands.
//!
//! Holds the loaded configuration and builds the rendering services from it,
//! pinned to the infra implementations.

use std::path::PathBuf;

use herald_core::render::{BoxMarkupRenderer, OutputRenderer};
use herald_core::rules::EvaluationMode;
use herald_core::workflow::WorkflowAssembler;
use herald_infra::config::{load_config, resolve_data_dir};
use herald_infra::markup::HtmlMarkupRenderer;
use herald_types::config::HeraldConfig;

pub struct AppState {
    pub config: HeraldConfig,
}

impl AppState {
    /// Load `config.toml` from `data_dir` (or the resolved default).
    pub async fn init(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir.unwrap_or_else(resolve_data_dir);
        let config = load_config(&data_dir).await;
        tracing::debug!(
            data_dir = %data_dir.display(),
            safe_mode = config.rules.safe_mode,
            wrap_document = config.email.wrap_document,
            "configuration loaded"
        );
        Self { config }
    }

    /// Skip-rule mode from config, unless overridden on the command line.
    pub fn evaluation_mode(&self, force_unsafe: bool) -> EvaluationMode {
        EvaluationMode::from_safe_flag(self.config.rules.safe_mode && !force_unsafe)
    }

    pub fn output_renderer(&self) -> OutputRenderer {
        OutputRenderer::new(BoxMarkupRenderer::new(HtmlMarkupRenderer::new(
            self.config.email.wrap_document,
        )))
    }

    pub fn assembler(&self, force_unsafe: bool) -> WorkflowAssembler {
        WorkflowAssembler::new(self.output_renderer()).with_mode(self.evaluation_mode(force_unsafe))
    }
}
