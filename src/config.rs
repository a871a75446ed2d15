use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ADVISOR_MODEL: &str = "gemini/gemini-3-flash-preview";
const DEFAULT_ADVISOR_TIMEOUT_SECS: u64 = 60;
const DEFAULT_ADVISOR_MAX_IMAGE_BYTES: usize = 15 * 1024 * 1024;
/// Room for the JSON envelope and message text around the base64 image.
const REQUEST_ENVELOPE_BYTES: usize = 64 * 1024;
const DEFAULT_WORKSPACE_IDLE_TTL_HOURS: i64 = 12;
const DEFAULT_WORKSPACE_SWEEP_INTERVAL_MINUTES: u64 = 15;

const DEFAULT_SYSTEM_PROMPT: &str = "You are an encouraging and knowledgeable high school guidance counselor. Your goal is to help students understand their graduation requirements. When a student uploads an image of their credit breakdown or transcript, analyze it carefully to identify missing credits, required subjects, and offer strategic advice on what classes to take next. Be concise but warm.";

const DEFAULT_WELCOME_MESSAGE: &str = "Hi there! I'm your Graduation Advisor. You can upload a photo of your credit breakdown or transcript, and I'll help you figure out what you still need to graduate. Or just ask me anything about your schedule!";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub advisor: AdvisorSettings,
    pub workspaces: WorkspaceSettings,
}

#[derive(Clone, Debug)]
pub struct AdvisorSettings {
    pub model: String,
    pub system_prompt: String,
    pub welcome_message: String,
    pub request_timeout: Duration,
    /// Largest decoded image accepted with an advisor message.
    pub max_image_bytes: usize,
}

impl AdvisorSettings {
    /// Body size limit for message submissions: the base64 form of the largest
    /// accepted image plus the JSON envelope.
    pub fn request_body_limit(&self) -> usize {
        self.max_image_bytes
            .div_ceil(3)
            .saturating_mul(4)
            .saturating_add(REQUEST_ENVELOPE_BYTES)
    }
}

#[derive(Clone, Debug)]
pub struct WorkspaceSettings {
    pub idle_ttl: chrono::Duration,
    pub sweep_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            advisor: AdvisorSettings::default(),
            workspaces: WorkspaceSettings::default(),
        }
    }
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_ADVISOR_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_ADVISOR_TIMEOUT_SECS),
            max_image_bytes: DEFAULT_ADVISOR_MAX_IMAGE_BYTES,
        }
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            idle_ttl: chrono::Duration::hours(DEFAULT_WORKSPACE_IDLE_TTL_HOURS),
            sweep_interval: Duration::from_secs(DEFAULT_WORKSPACE_SWEEP_INTERVAL_MINUTES * 60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let port = parse_or(&lookup, "PORT", defaults.port)?;

        let model = non_empty(&lookup, "ADVISOR_MODEL").unwrap_or(defaults.advisor.model);
        crate::llm::parse_model_provider(&model)
            .with_context(|| format!("ADVISOR_MODEL has an invalid value: {model}"))?;

        let system_prompt =
            non_empty(&lookup, "ADVISOR_SYSTEM_PROMPT").unwrap_or(defaults.advisor.system_prompt);
        let timeout_secs = parse_or(&lookup, "ADVISOR_TIMEOUT_SECS", DEFAULT_ADVISOR_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(anyhow!("ADVISOR_TIMEOUT_SECS must be greater than zero"));
        }
        let max_image_bytes = parse_or(
            &lookup,
            "ADVISOR_MAX_IMAGE_BYTES",
            DEFAULT_ADVISOR_MAX_IMAGE_BYTES,
        )?;
        if max_image_bytes == 0 {
            return Err(anyhow!("ADVISOR_MAX_IMAGE_BYTES must be greater than zero"));
        }

        let ttl_hours = parse_or(
            &lookup,
            "WORKSPACE_IDLE_TTL_HOURS",
            DEFAULT_WORKSPACE_IDLE_TTL_HOURS,
        )?;
        if ttl_hours <= 0 {
            return Err(anyhow!("WORKSPACE_IDLE_TTL_HOURS must be greater than zero"));
        }
        let idle_ttl = chrono::TimeDelta::try_hours(ttl_hours)
            .context("WORKSPACE_IDLE_TTL_HOURS is out of range")?;
        let sweep_minutes = parse_or(
            &lookup,
            "WORKSPACE_SWEEP_INTERVAL_MINUTES",
            DEFAULT_WORKSPACE_SWEEP_INTERVAL_MINUTES,
        )?;
        if sweep_minutes == 0 {
            return Err(anyhow!(
                "WORKSPACE_SWEEP_INTERVAL_MINUTES must be greater than zero"
            ));
        }
        let sweep_secs = sweep_minutes
            .checked_mul(60)
            .context("WORKSPACE_SWEEP_INTERVAL_MINUTES is out of range")?;

        Ok(Self {
            port,
            advisor: AdvisorSettings {
                model,
                system_prompt,
                welcome_message: defaults.advisor.welcome_message,
                request_timeout: Duration::from_secs(timeout_secs),
                max_image_bytes,
            },
            workspaces: WorkspaceSettings {
                idle_ttl,
                sweep_interval: Duration::from_secs(sweep_secs),
            },
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
