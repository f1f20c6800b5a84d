use aws_config::BehaviorVersion;
use log::info;

use crate::{config::Config, error::Error, webhook::WebhookOperation};

const DATABASE_URL_PARAMETER: &str = "/sim-feed/database-url";

/// Where signing secrets and the database URL come from.
/// Built once at startup and shared by every invocation.
pub enum SecretResolver {
    Environment(Config),
    ParameterStore(aws_sdk_ssm::Client),
}

impl SecretResolver {
    pub async fn from_config(config: &Config) -> Self {
        if config.use_parameter_store() {
            info!("Resolving secrets from parameter store");
            let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
            SecretResolver::ParameterStore(aws_sdk_ssm::Client::new(&sdk_config))
        } else {
            SecretResolver::Environment(config.clone())
        }
    }

    /// `None` only happens with environment variables: the webhook then fails
    /// verification. A parameter without value is fatal.
    pub async fn signing_secret(
        &self,
        operation: WebhookOperation,
    ) -> Result<Option<String>, Error> {
        match self {
            SecretResolver::Environment(config) => Ok(match operation {
                WebhookOperation::Insert => config.signing_secret_insert.clone(),
                WebhookOperation::Update => config.signing_secret_update.clone(),
                WebhookOperation::Delete => config.signing_secret_delete.clone(),
            }),
            SecretResolver::ParameterStore(client) => {
                let value = fetch_parameter(client, &operation.parameter_name()).await?;
                value
                    .map(Some)
                    .ok_or_else(|| Error::ConfigMissing(operation.env_key().to_string()))
            }
        }
    }

    pub async fn database_url(&self) -> Result<String, Error> {
        match self {
            SecretResolver::Environment(config) => config
                .database_url
                .clone()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| Error::ConfigMissing("DATABASE_URL".into())),
            SecretResolver::ParameterStore(client) => {
                fetch_parameter(client, DATABASE_URL_PARAMETER)
                    .await?
                    .ok_or_else(|| Error::ConfigMissing("DATABASE_URL".into()))
            }
        }
    }
}

async fn fetch_parameter(
    client: &aws_sdk_ssm::Client,
    name: &str,
) -> Result<Option<String>, Error> {
    let output = client
        .get_parameter()
        .name(name)
        .with_decryption(true)
        .send()
        .await
        .map_err(|e| Error::SecretStoreError(format!("{}: {}", name, e)))?;

    Ok(output
        .parameter()
        .and_then(|p| p.value())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_environment_secrets() -> Result<(), Error> {
        let config = Config {
            signing_secret_update: Some("whsec_dXBkYXRl".into()),
            database_url: Some("postgres://localhost/sim_feed".into()),
            ..Default::default()
        };
        let resolver = SecretResolver::from_config(&config).await;

        assert_eq!(
            Some("whsec_dXBkYXRl".to_string()),
            resolver.signing_secret(WebhookOperation::Update).await?
        );
        assert_eq!(None, resolver.signing_secret(WebhookOperation::Delete).await?);
        assert_eq!("postgres://localhost/sim_feed", resolver.database_url().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_environment_missing_database_url() {
        let resolver = SecretResolver::Environment(Config::default());
        let err = resolver.database_url().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
