//! Which downstream model the relay currently targets.

use std::fmt;

use tokio::sync::RwLock;
use tracing::info;

use crate::config::UpstreamConfig;

/// A user-facing model alias with its own switch route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelAlias {
    Qwen,
    Mis,
}

impl fmt::Display for ModelAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelAlias::Qwen => write!(f, "qwen"),
            ModelAlias::Mis => write!(f, "mis"),
        }
    }
}

/// Mutable model selection shared by all handlers.
///
/// Writers replace the whole name; readers copy it out, so a forwarding call
/// resolves its target URL exactly once.
#[derive(Debug)]
pub struct ModelSelection {
    current: RwLock<String>,
    qwen: String,
    mis: String,
}

impl ModelSelection {
    pub fn new(upstream: &UpstreamConfig) -> Self {
        Self {
            current: RwLock::new(upstream.default_model.clone()),
            qwen: upstream.models.qwen.clone(),
            mis: upstream.models.mis.clone(),
        }
    }

    /// Downstream model name behind an alias.
    pub fn model_for(&self, alias: ModelAlias) -> &str {
        match alias {
            ModelAlias::Qwen => &self.qwen,
            ModelAlias::Mis => &self.mis,
        }
    }

    /// Snapshot of the current model name.
    pub async fn current(&self) -> String {
        self.current.read().await.clone()
    }

    /// Switch to the model behind `alias` and return its name.
    pub async fn select(&self, alias: ModelAlias) -> String {
        let model = self.model_for(alias).to_string();
        let previous = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, model.clone())
        };
        info!(%alias, from = previous, to = model, "Model selection changed");
        model
    }
}
