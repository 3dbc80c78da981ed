use std::env::var;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub model_path: String,
    pub host_address: String,
    pub port: u16,
}

impl EnvConfig {
    pub fn new() -> Self {
        let model_path = var("MODEL_PATH").unwrap_or_else(|_| "models/classifier.onnx".to_owned());
        let host_address = var("HOST_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_owned());
        let port = var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        Self {
            model_path,
            host_address,
            port,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host_address, self.port)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = EnvConfig {
            model_path: "models/classifier.onnx".to_owned(),
            host_address: "127.0.0.1".to_owned(),
            port: 9000,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }
}
