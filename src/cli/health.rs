use crate::config::Config;
use crate::gateway::{Health, HttpGateway};
use crate::die;

fn describe(health: &Health) -> String {
    let mut out = health.status.clone();

    if let Some(service) = &health.service {
        out.push_str(&format!(" ({})", service));
    }

    if let Some(message) = &health.message {
        out.push_str(&format!(": {}", message));
    }

    out
}

/// Probes the health endpoint and reports the result. Exits non-zero when the
/// service cannot be reached or does not answer sensibly.
pub(crate) async fn health_cmd(config: &Config) {
    let gateway = match HttpGateway::with_endpoints(
        &config.gateway.api_base,
        &config.gateway.ask_path,
        &config.gateway.health_path,
    ) {
        Ok(gateway) => gateway,
        Err(err) => die!("{}", err),
    };

    match gateway.health().await {
        Ok(health) => println!("{}: {}", gateway.health_url(), describe(&health)),
        Err(err) => die!("health check of {} failed: {}", gateway.health_url(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let health = Health {
            status: "healthy".to_string(),
            service: Some("datasaudi-chatbot-minimal".to_string()),
            message: None,
        };

        assert_eq!(describe(&health), "healthy (datasaudi-chatbot-minimal)");

        let health = Health {
            status: "ok".to_string(),
            service: None,
            message: Some("DataSaudi Chatbot API is running".to_string()),
        };

        assert_eq!(describe(&health), "ok: DataSaudi Chatbot API is running");
    }
}
