// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub redaction_enabled: bool,
    pub json_output: bool,
    pub log_level: String,
}

impl LoggerConfig {
    /// Default filter directive: `log_level` for the given crates, quieter
    /// levels for the HTTP and database stacks
    pub fn filter_directive(&self, targets: &[&str]) -> String {
        let mut directives: Vec<String> = targets
            .iter()
            .map(|target| format!("{}={}", target, self.log_level))
            .collect();
        directives.push("tower_http=info".to_string());
        directives.push("sqlx=warn".to_string());
        directives.join(",")
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            redaction_enabled: true,
            json_output: false,
            log_level: "info".to_string(),
        }
    }
}
