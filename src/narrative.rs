//! AI commentary on the ratio report through an OpenAI-compatible chat API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::ReportError;
use crate::export::format_ratio_value;
use crate::ratios::{RatioCategory, RatioKind, RatioReport};

const SYSTEM_PROMPT: &str = "You are a senior financial analyst. Write concise, factual \
commentary in Markdown based only on the figures provided. Do not invent numbers.";

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Body of a chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Model name.
    pub model: String,
    /// Conversation.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling.
    pub top_p: f32,
    /// Completion token limit.
    pub max_tokens: u32,
}

/// Something that answers chat-completion requests.
pub trait ChatBackend {
    /// Returns the assistant's reply.
    fn complete(&self, request: &CompletionRequest) -> Result<String, ReportError>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Blocking client for `{base_url}/chat/completions` with bearer authentication.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiCompatClient {
    /// Builds a client for an explicit endpoint and key.
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, ReportError> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Builds a client from configuration, reading the key from its environment variable.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ReportError> {
        Self::new(
            &config.base_url,
            config.api_key()?,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl ChatBackend for OpenAiCompatClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ReportError> {
        log::debug!("POST {} ({} messages)", self.endpoint, request.messages.len());
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReportError::Llm(format!("{status}: {body}")));
        }

        let reply: CompletionResponse = response.json()?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ReportError::Llm("empty completion".to_string()))
    }
}

/// Stages of the commentary, each one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NarrativePhase {
    /// Liquidity and leverage.
    LiquidityLeverage,
    /// Profitability and activity.
    ProfitabilityActivity,
    /// Conclusion built on the two previous sections.
    Conclusion,
}

impl NarrativePhase {
    /// Phases in generation order.
    pub const ALL: [Self; 3] = [
        Self::LiquidityLeverage,
        Self::ProfitabilityActivity,
        Self::Conclusion,
    ];

    /// Section heading.
    pub const fn title(self) -> &'static str {
        match self {
            Self::LiquidityLeverage => "Liquidity and leverage",
            Self::ProfitabilityActivity => "Profitability and activity",
            Self::Conclusion => "Conclusion",
        }
    }

    const fn categories(self) -> &'static [RatioCategory] {
        match self {
            Self::LiquidityLeverage => &[RatioCategory::Liquidity, RatioCategory::Leverage],
            Self::ProfitabilityActivity => {
                &[RatioCategory::Profitability, RatioCategory::Activity]
            }
            Self::Conclusion => &[
                RatioCategory::Liquidity,
                RatioCategory::Leverage,
                RatioCategory::Profitability,
                RatioCategory::Activity,
            ],
        }
    }

    const fn max_tokens(self, config: &LlmConfig) -> u32 {
        match self {
            Self::LiquidityLeverage => config.max_tokens.liquidity_leverage,
            Self::ProfitabilityActivity => config.max_tokens.profitability_activity,
            Self::Conclusion => config.max_tokens.conclusion,
        }
    }
}

/// One generated section.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeSection {
    /// Phase the section answers.
    pub phase: NarrativePhase,
    /// Model output.
    pub text: String,
}

/// Generated commentary.
#[derive(Debug, Clone, Serialize)]
pub struct Narrative {
    /// Company analysed.
    pub company: String,
    /// Years covered.
    pub years: Vec<i32>,
    /// Sections in generation order.
    pub sections: Vec<NarrativeSection>,
}

impl Narrative {
    /// Renders the commentary as one Markdown document.
    pub fn to_markdown(&self) -> String {
        let span = match (self.years.first(), self.years.last()) {
            (Some(first), Some(last)) if first != last => format!("{first}-{last}"),
            (Some(year), _) => year.to_string(),
            _ => String::new(),
        };
        let mut out = format!("# Financial analysis: {} {span}\n", self.company);
        for section in &self.sections {
            out.push_str(&format!("\n## {}\n\n{}\n", section.phase.title(), section.text));
        }
        out
    }
}

/// Builds the prompts and collects the commentary.
#[derive(Debug)]
pub struct NarrativeGenerator<B> {
    backend: B,
    config: LlmConfig,
}

impl<B: ChatBackend> NarrativeGenerator<B> {
    /// Creates a generator over a chat backend.
    pub const fn new(backend: B, config: LlmConfig) -> Self {
        Self { backend, config }
    }

    /// Request for one phase; the conclusion also receives the earlier sections.
    pub fn request(
        &self,
        phase: NarrativePhase,
        ratios: &RatioReport,
        previous: &[NarrativeSection],
    ) -> CompletionRequest {
        let mut prompt = format!(
            "Company: {}\nYears: {}\n\n{}\n",
            ratios.company,
            ratios
                .years
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            ratio_table(ratios, phase.categories()),
        );
        match phase {
            NarrativePhase::LiquidityLeverage => prompt.push_str(
                "\nAssess short-term solvency and the financing structure: level, trend \
                 and risks of each ratio.",
            ),
            NarrativePhase::ProfitabilityActivity => prompt.push_str(
                "\nAssess profitability and how efficiently assets, receivables and \
                 inventories are used: level, trend and drivers.",
            ),
            NarrativePhase::Conclusion => {
                for section in previous {
                    prompt.push_str(&format!(
                        "\n### {}\n{}\n",
                        section.phase.title(),
                        section.text
                    ));
                }
                prompt.push_str(
                    "\nWrite an integrated conclusion: overall financial health, main \
                     strengths, main weaknesses and recommendations.",
                );
            }
        }

        CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_PROMPT),
                ChatMessage::new("user", prompt),
            ],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: phase.max_tokens(&self.config),
        }
    }

    /// Runs the three phases in order.
    pub fn generate(&self, ratios: &RatioReport) -> Result<Narrative, ReportError> {
        let mut sections: Vec<NarrativeSection> = Vec::with_capacity(NarrativePhase::ALL.len());
        for phase in NarrativePhase::ALL {
            log::info!("generating {}", phase.title());
            let request = self.request(phase, ratios, &sections);
            let text = self.backend.complete(&request)?;
            sections.push(NarrativeSection { phase, text });
        }
        Ok(Narrative {
            company: ratios.company.clone(),
            years: ratios.years.clone(),
            sections,
        })
    }
}

/// Markdown table of the ratios in the given categories, one column per year.
fn ratio_table(ratios: &RatioReport, categories: &[RatioCategory]) -> String {
    let mut lines = Vec::new();
    let mut header = vec!["Ratio".to_string()];
    header.extend(ratios.years.iter().map(ToString::to_string));
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!("|{}", "---|".repeat(header.len())));

    for kind in RatioKind::ALL
        .into_iter()
        .filter(|kind| categories.contains(&kind.category()))
    {
        let mut row = vec![kind.label().to_string()];
        row.extend(
            ratios
                .series(kind)
                .into_iter()
                .map(|(_, value)| format_ratio_value(kind, value)),
        );
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines.join("\n")
}
