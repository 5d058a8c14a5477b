use serde_json::{Value, json};
use zephyr::prelude::*;

#[controller(path = "/health")]
pub struct HealthController {}

#[routes]
impl HealthController {
    #[get]
    fn check(&self, #[inject] config: Arc<ConfigService>) -> Value {
        let config = config.get();
        json!({ "status": "ok", "port": config.app.port })
    }
}

#[module(controllers = [HealthController])]
pub struct HealthModule;
