//! Closure-backed plugin

use super::{Args, Plugin};
use crate::error::PluginError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

type InvokeFn = dyn Fn(Args) -> BoxFuture<'static, Result<Args, PluginError>> + Send + Sync;

/// Plugin defined by its metadata and an async handler
#[derive(Clone)]
pub struct SimplePlugin {
    name: String,
    description: String,
    input_example: String,
    handler: Arc<InvokeFn>,
}

impl SimplePlugin {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_example: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Args, PluginError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_example: input_example.into(),
            handler: Arc::new(move |args| handler(args).boxed()),
        }
    }
}

#[async_trait]
impl Plugin for SimplePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_example(&self) -> &str {
        &self.input_example
    }

    async fn invoke(&self, args: Args) -> Result<Args, PluginError> {
        (self.handler)(args).await
    }
}

impl std::fmt::Debug for SimplePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplePlugin")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_example", &self.input_example)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_plugin_metadata() {
        let plugin = SimplePlugin::new(
            "Google",
            "Search the web",
            r#"{"query": "search terms"}"#,
            |args| async move { Ok(args) },
        );

        assert_eq!(plugin.name(), "Google");
        assert_eq!(plugin.description(), "Search the web");
        assert_eq!(plugin.input_example(), r#"{"query": "search terms"}"#);
    }

    #[test]
    fn test_simple_plugin_invoke() {
        let plugin = SimplePlugin::new("Echo", "Echo the query", "{}", |args: Args| async move {
            let mut result = Args::new();
            result.insert("result".to_string(), json!(true));
            result.insert(
                "echo".to_string(),
                args.get("query").cloned().unwrap_or_default(),
            );
            Ok(result)
        });

        let mut args = Args::new();
        args.insert("query".to_string(), json!("hello"));

        let result = tokio_test::block_on(plugin.invoke(args)).unwrap();
        assert_eq!(result["echo"], json!("hello"));
        assert_eq!(result["result"], json!(true));
    }

    #[tokio::test]
    async fn test_simple_plugin_error() {
        let plugin = SimplePlugin::new("Broken", "Always fails", "{}", |_| async {
            Err(PluginError::Execution("boom".to_string()))
        });

        let err = plugin.invoke(Args::new()).await.unwrap_err();
        assert!(matches!(err, PluginError::Execution(msg) if msg == "boom"));
    }
}
