use crate::config::{Config, ConfigLoader};
use crate::error::Result;
use std::sync::{Arc, PoisonError, RwLock};

/// Configuration service
///
/// Registered in the container at startup so services can inject it. Reads
/// hand out a snapshot; a reload replaces the whole structure.
#[derive(Clone, Default)]
pub struct ConfigService {
    current: Arc<RwLock<Arc<Config>>>,
}

impl ConfigService {
    pub fn new(config: Config) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn get(&self) -> Arc<Config> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn replace(&self, config: Config) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        tracing::info!("Configuration replaced");
    }

    /// Load again with `loader` and swap the result in
    pub async fn reload(&self, loader: &ConfigLoader) -> Result<Arc<Config>> {
        let config = loader.load().await?;
        self.replace(config);
        Ok(self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_swaps_whole_config() {
        let service = ConfigService::new(Config::default());
        let before = service.get();

        let mut next = Config::default();
        next.app.port = 8081;
        service.replace(next);

        assert_eq!(before.app.port, 3000);
        assert_eq!(service.get().app.port, 8081);
    }
}
