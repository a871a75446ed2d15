use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};

use crate::{
    advisor::LlmAdvisor,
    config::AppConfig,
    llm::LlmClient,
    web::workspace::WorkspaceRegistry,
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    advisor: LlmAdvisor,
    workspaces: WorkspaceRegistry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let llm_client = LlmClient::from_env().context("failed to initialize LLM client")?;
        let advisor = LlmAdvisor::new(
            llm_client,
            config.advisor.model.as_str(),
            config.advisor.system_prompt.as_str(),
        );
        let workspaces = WorkspaceRegistry::new(
            &config.advisor.welcome_message,
            config.workspaces.idle_ttl,
        );

        Ok(Self {
            config: Arc::new(config),
            advisor,
            workspaces,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn advisor(&self) -> LlmAdvisor {
        self.advisor.clone()
    }

    pub fn advisor_timeout(&self) -> Duration {
        self.config.advisor.request_timeout
    }

    pub fn workspaces(&self) -> &WorkspaceRegistry {
        &self.workspaces
    }
}
