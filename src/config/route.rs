use super::schema::{GatewayConfig, RouteConfig, ScriptRef};
use crate::error::ScriptError;
use crate::pipeline::{Chain, Filter, ScriptableFilter, ScriptableHandler};
use crate::script::{DefaultEnvironment, Environment, Script, ScriptRegistry};
use std::sync::Arc;
use tracing::{debug, info};

impl GatewayConfig {
    pub fn environment(&self) -> DefaultEnvironment {
        DefaultEnvironment::new(&self.base_dir)
    }
}

impl ScriptRef {
    /// Compile the referenced script through `registry`
    pub fn load(
        &self,
        env: &dyn Environment,
        registry: &ScriptRegistry,
    ) -> Result<Script, ScriptError> {
        debug!(script = %self.describe(), mime_type = %self.mime_type, "Loading script");

        match (&self.file, &self.source) {
            (Some(file), _) => registry.load_file(env, &self.mime_type, file),
            (None, Some(source)) => registry.load_source(env, &self.mime_type, &source.to_source()),
            (None, None) => Err(ScriptError::Load {
                name: self.describe(),
                source: "neither a file nor inline source was given".into(),
            }),
        }
    }
}

impl RouteConfig {
    /// Compile every script in the route and compose them into a chain
    pub fn build(
        &self,
        env: &dyn Environment,
        registry: &ScriptRegistry,
    ) -> Result<Chain, ScriptError> {
        let filters = self
            .filters
            .iter()
            .map(|filter| filter.load(env, registry))
            .collect::<Result<Vec<_>, ScriptError>>()?;
        let handler = self.handler.load(env, registry)?;

        Ok(self.compose(filters, handler))
    }

    /// Compose already compiled scripts, given in route order, into a chain
    pub fn compose(&self, filters: Vec<Script>, handler: Script) -> Chain {
        let filters: Vec<Arc<dyn Filter>> = filters
            .into_iter()
            .zip(&self.filters)
            .map(|(script, filter)| {
                Arc::new(ScriptableFilter::new(script).with_args(filter.args.clone()))
                    as Arc<dyn Filter>
            })
            .collect();
        let handler = ScriptableHandler::new(handler).with_args(self.handler.args.clone());

        info!(filters = filters.len(), "Built route");
        Chain::new(filters, Arc::new(handler))
    }
}
