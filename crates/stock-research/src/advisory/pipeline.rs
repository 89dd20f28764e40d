//! Client profile to final portfolio
//!
//! Four stages run in order, each handing a validated record to the next:
//!
//! 1. `client_profile_agent` assesses the [`ClientProfile`]
//! 2. `portfolio_constructor_agent` drafts a [`Portfolio`]
//! 3. `stock_research_agent` writes a [`StockReport`] per drafted asset
//! 4. `portfolio_refine_agent` turns draft and reports into the final
//!    [`Portfolio`]

use super::models::{
    Asset, ClientProfile, ClientSummary, Portfolio, StockReport, Validate, parse_reply,
};
use super::prompts::{CONSTRUCTOR_PROMPT, PROFILE_PROMPT, REPORT_PROMPT, refine_prompt};
use crate::config::ResearchConfig;
use crate::error::{Result, StockError};
use crate::research::{StockResearcher, chat_model, final_text};
use crate::state::ResearchState;
use crate::symbol::Symbol;
use agent_llm::{LLMProvider, Message};
use agent_runtime::{AgentRuntime, ReactAgent};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

pub const PROFILE_AGENT: &str = "client_profile_agent";
pub const CONSTRUCTOR_AGENT: &str = "portfolio_constructor_agent";
pub const RESEARCH_AGENT: &str = "stock_research_agent";
pub const REFINE_AGENT: &str = "portfolio_refine_agent";

/// One stage's raw reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    pub agent: String,
    pub content: String,
}

/// Everything an advisory run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub summary: ClientSummary,
    /// Portfolio before research
    pub draft: Portfolio,
    /// One report per drafted asset, in draft order
    pub reports: Vec<StockReport>,
    /// Final portfolio
    pub portfolio: Portfolio,
    pub transcript: Vec<StageOutput>,
}

/// Multi-agent investment advisor
///
/// The research stage uses a [`StockResearcher`] and therefore the market
/// data tools; the other stages are tool-less model calls.
pub struct AdvisoryPipeline {
    profiler: Arc<dyn AgentRuntime>,
    constructor: Arc<dyn AgentRuntime>,
    researcher: StockResearcher,
    refiner: Arc<dyn AgentRuntime>,
}

impl std::fmt::Debug for AdvisoryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisoryPipeline").finish_non_exhaustive()
    }
}

impl AdvisoryPipeline {
    /// Assemble from explicit stage runtimes
    pub fn new(
        profiler: Arc<dyn AgentRuntime>,
        constructor: Arc<dyn AgentRuntime>,
        researcher: StockResearcher,
        refiner: Arc<dyn AgentRuntime>,
    ) -> Self {
        Self {
            profiler,
            constructor,
            researcher,
            refiner,
        }
    }

    /// OpenAI-compatible stages over the configured tool source
    ///
    /// Tool discovery for the research stage runs on the calling thread.
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let researcher = StockResearcher::from_config(&report_config(config))?;
        Self::with_researcher(config, researcher)
    }

    /// [`Self::from_config`] with tool discovery suspending on network I/O
    pub async fn from_config_async(config: &ResearchConfig) -> Result<Self> {
        let researcher = StockResearcher::from_config_async(&report_config(config)).await?;
        Self::with_researcher(config, researcher)
    }

    fn with_researcher(config: &ResearchConfig, researcher: StockResearcher) -> Result<Self> {
        let llm: Arc<dyn LLMProvider> = Arc::new(chat_model(config)?);
        let stage = |prompt: &str| -> Result<Arc<dyn AgentRuntime>> {
            let agent = ReactAgent::builder()
                .provider(Arc::clone(&llm))
                .model(config.model.as_str())
                .system_prompt(prompt)
                .max_tokens(config.max_tokens)
                .temperature(config.temperature)
                .max_iterations(config.max_iterations)
                .build()?;
            Ok(Arc::new(agent))
        };

        Ok(Self::new(
            stage(PROFILE_PROMPT)?,
            stage(CONSTRUCTOR_PROMPT)?,
            researcher,
            stage(&refine_prompt())?,
        ))
    }

    /// Run every stage, suspending on network I/O
    #[instrument(skip_all, fields(risk = profile.risk_tolerance))]
    pub async fn advise(&self, profile: &ClientProfile) -> Result<Advice> {
        let mut run = AdvisoryRun::new(profile)?;

        let reply = self.profiler.invoke(run.profile_messages()).await?;
        let summary: ClientSummary = run.record(PROFILE_AGENT, &final_text(&reply))?;

        let reply = self.constructor.invoke(run.handoff_messages()).await?;
        let draft: Portfolio = run.record(CONSTRUCTOR_AGENT, &final_text(&reply))?;

        let mut reports = Vec::with_capacity(draft.assets.len());
        for state in run.research_states(&draft)? {
            let text = self.researcher.research_state_async(&state).await?;
            reports.push(run.record_report(state.symbol(), &text)?);
        }

        let reply = self.refiner.invoke(run.refine_messages()).await?;
        let portfolio: Portfolio = run.record(REFINE_AGENT, &final_text(&reply))?;

        Ok(run.finish(summary, draft, reports, portfolio))
    }

    /// Run every stage on the calling thread
    #[instrument(skip_all, fields(risk = profile.risk_tolerance))]
    pub fn advise_blocking(&self, profile: &ClientProfile) -> Result<Advice> {
        let mut run = AdvisoryRun::new(profile)?;

        let reply = self.profiler.invoke_blocking(run.profile_messages())?;
        let summary: ClientSummary = run.record(PROFILE_AGENT, &final_text(&reply))?;

        let reply = self.constructor.invoke_blocking(run.handoff_messages())?;
        let draft: Portfolio = run.record(CONSTRUCTOR_AGENT, &final_text(&reply))?;

        let mut reports = Vec::with_capacity(draft.assets.len());
        for state in run.research_states(&draft)? {
            let text = self.researcher.research_state(&state)?;
            reports.push(run.record_report(state.symbol(), &text)?);
        }

        let reply = self.refiner.invoke_blocking(run.refine_messages())?;
        let portfolio: Portfolio = run.record(REFINE_AGENT, &final_text(&reply))?;

        Ok(run.finish(summary, draft, reports, portfolio))
    }
}

fn report_config(config: &ResearchConfig) -> ResearchConfig {
    let mut config = config.clone();
    config.system_prompt = Some(REPORT_PROMPT.to_string());
    config
}

/// Stage inputs and the transcript, shared by both entry points
struct AdvisoryRun<'a> {
    profile: &'a ClientProfile,
    transcript: Vec<StageOutput>,
}

impl<'a> AdvisoryRun<'a> {
    fn new(profile: &'a ClientProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            transcript: Vec::new(),
        })
    }

    fn profile_text(&self) -> String {
        serde_json::to_string_pretty(self.profile)
            .unwrap_or_else(|_| format!("{:?}", self.profile))
    }

    fn profile_messages(&self) -> Vec<Message> {
        vec![Message::user(self.profile_text())]
    }

    fn last_output(&self) -> &str {
        self.transcript.last().map_or("", |stage| stage.content.as_str())
    }

    fn history(&self) -> String {
        self.transcript
            .iter()
            .map(|stage| format!("{}: {}", stage.agent, stage.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn handoff_messages(&self) -> Vec<Message> {
        vec![Message::user(format!(
            "CLIENT PROFILE:\n{}\n\nPREVIOUS AGENT OUTPUT (ClientSummary):\n{}",
            self.profile_text(),
            self.last_output()
        ))]
    }

    fn research_states(&self, draft: &Portfolio) -> Result<Vec<ResearchState>> {
        let portfolio = serde_json::to_string_pretty(draft)?;
        draft
            .assets
            .iter()
            .map(|asset| self.research_state(asset, &portfolio))
            .collect()
    }

    fn research_state(&self, asset: &Asset, portfolio: &str) -> Result<ResearchState> {
        let query = format!(
            "Research {} ({:.1}% of the draft portfolio) for this client and reply with a \
             StockReport JSON object.",
            asset.ticker, asset.allocation_percentage
        );
        let context = format!(
            "CLIENT PROFILE:\n{}\n\nDRAFT PORTFOLIO:\n{portfolio}\n\nSELECTION RATIONALE:\n{}",
            self.profile_text(),
            asset.rationale
        );
        Ok(ResearchState::new(&asset.ticker, Some(query.as_str()))?.with_messages([Message::user(context)]))
    }

    fn refine_messages(&self) -> Vec<Message> {
        vec![Message::user(format!(
            "CLIENT PROFILE:\n{}\n\nPREVIOUS AGENT OUTPUT (Stock Research Analysis):\n{}\n\n\
             CONVERSATION HISTORY:\n{}",
            self.profile_text(),
            self.last_output(),
            self.history()
        ))]
    }

    fn record<T>(&mut self, agent: &str, text: &str) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let value = parse_reply(text).map_err(|e| match e {
            StockError::Validation(msg) => StockError::Validation(format!("{agent}: {msg}")),
            other => other,
        })?;
        info!(agent, "Stage complete");
        self.transcript.push(StageOutput {
            agent: agent.to_string(),
            content: text.trim().to_string(),
        });
        Ok(value)
    }

    fn record_report(&mut self, ticker: &Symbol, text: &str) -> Result<StockReport> {
        let report: StockReport = self.record(RESEARCH_AGENT, text)?;
        if &report.ticker != ticker {
            return Err(StockError::Validation(format!(
                "{RESEARCH_AGENT}: asked for {ticker}, got a report on {}",
                report.ticker
            )));
        }
        Ok(report)
    }

    fn finish(
        self,
        summary: ClientSummary,
        draft: Portfolio,
        reports: Vec<StockReport>,
        portfolio: Portfolio,
    ) -> Advice {
        info!(
            draft = draft.assets.len(),
            refined = portfolio.assets.len(),
            "Advisory run complete"
        );
        Advice {
            summary,
            draft,
            reports,
            portfolio,
            transcript: self.transcript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_runtime::AgentResponse;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a queue and records every conversation it is handed
    #[derive(Default)]
    struct ScriptedRuntime {
        replies: Mutex<VecDeque<String>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedRuntime {
        fn new(replies: impl IntoIterator<Item = String>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                seen: Mutex::default(),
            })
        }

        fn opening_texts(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|messages| {
                    messages
                        .iter()
                        .filter_map(Message::text)
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .collect()
        }
    }

    #[async_trait]
    impl AgentRuntime for ScriptedRuntime {
        async fn invoke(&self, messages: Vec<Message>) -> agent_core::Result<AgentResponse> {
            self.invoke_blocking(messages)
        }

        fn invoke_blocking(
            &self,
            mut messages: Vec<Message>,
        ) -> agent_core::Result<AgentResponse> {
            self.seen.lock().unwrap().push(messages.clone());
            let reply = self.replies.lock().unwrap().pop_front().ok_or_else(|| {
                agent_core::Error::ProcessingFailed("script exhausted".to_string())
            })?;
            messages.push(Message::assistant(reply));
            Ok(AgentResponse::new(messages))
        }
    }

    fn profile() -> ClientProfile {
        ClientProfile::new(
            7,
            "aggressive growth for retirement",
            100_000,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap()
        .with_end_date(NaiveDate::from_ymd_opt(2034, 1, 1).unwrap())
        .unwrap()
    }

    fn summary() -> String {
        json!({
            "recommended_portfolio_type": "Growth",
            "expected_yearly_returns": 9.0,
            "risk_level": "Moderately high",
            "initial_portfolio_allocation": "85% equities, 15% bonds",
            "monthly_contribution": 750.0
        })
        .to_string()
    }

    fn portfolio(assets: &[(&str, f64)]) -> String {
        let assets: Vec<_> = assets
            .iter()
            .map(|(ticker, share)| {
                json!({"ticker": ticker, "allocation_percentage": share, "rationale": "fits goals"})
            })
            .collect();
        json!({"assets": assets, "total_allocation": 100.0, "strategy_summary": "Core growth"})
            .to_string()
    }

    fn report(ticker: &str, rating: &str) -> String {
        let body = json!({
            "company_name": format!("{ticker} Corp"),
            "ticker": ticker,
            "exchange": "NYSE",
            "analyst": "stock_research_agent",
            "report_date": "2024-05-01",
            "rating": rating,
            "current_price": 100.0,
            "target_price": 112.0,
            "upside_percent": 12.0,
            "summary_points": [{"point": "Solid balance sheet"}],
            "executive_summary": "Fine.",
            "business_overview": "Diversified.",
            "recent_performance": "Flat.",
            "financials": [],
            "ratios": {"pe_ratio": 21.0},
            "valuation": {"method": "DCF", "target_price": 112.0},
            "investment_thesis": [{"point": "Cash generation"}],
            "risks": [{"category": "Market", "description": "Rates"}],
            "conclusion": "Hold the position."
        });
        format!("```json\n{body}\n```")
    }

    struct Stages {
        profiler: Arc<ScriptedRuntime>,
        constructor: Arc<ScriptedRuntime>,
        researcher: Arc<ScriptedRuntime>,
        refiner: Arc<ScriptedRuntime>,
    }

    impl Stages {
        fn pipeline(&self) -> AdvisoryPipeline {
            AdvisoryPipeline::new(
                self.profiler.clone(),
                self.constructor.clone(),
                StockResearcher::new(self.researcher.clone()),
                self.refiner.clone(),
            )
        }
    }

    fn happy_stages() -> Stages {
        Stages {
            profiler: ScriptedRuntime::new([summary()]),
            constructor: ScriptedRuntime::new([portfolio(&[("aapl", 60.0), ("BND", 40.0)])]),
            researcher: ScriptedRuntime::new([report("AAPL", "Buy"), report("BND", "Sell")]),
            refiner: ScriptedRuntime::new([portfolio(&[("AAPL", 70.0), ("AGG", 30.0)])]),
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let stages = happy_stages();
        let advice = stages.pipeline().advise(&profile()).await.unwrap();

        assert_eq!(advice.summary.recommended_portfolio_type, "Growth");
        assert_eq!(advice.draft.assets.len(), 2);
        assert_eq!(advice.reports[1].rating.as_str(), "SELL");
        assert_eq!(
            advice.portfolio.tickers().map(Symbol::as_str).collect::<Vec<_>>(),
            ["AAPL", "AGG"]
        );
        assert_eq!(
            advice
                .transcript
                .iter()
                .map(|stage| stage.agent.as_str())
                .collect::<Vec<_>>(),
            [
                PROFILE_AGENT,
                CONSTRUCTOR_AGENT,
                RESEARCH_AGENT,
                RESEARCH_AGENT,
                REFINE_AGENT
            ]
        );

        let profiler_input = &stages.profiler.opening_texts()[0];
        assert!(profiler_input.contains("\"risk_tolerance\": 7"));

        let constructor_input = &stages.constructor.opening_texts()[0];
        assert!(constructor_input.contains("PREVIOUS AGENT OUTPUT (ClientSummary)"));
        assert!(constructor_input.contains("Moderately high"));

        let research_inputs = stages.researcher.opening_texts();
        assert!(research_inputs[0].starts_with("Research AAPL (60.0% of the draft portfolio)"));
        assert!(research_inputs[0].contains("DRAFT PORTFOLIO"));
        assert!(research_inputs[1].starts_with("Research BND"));

        let refiner_input = &stages.refiner.opening_texts()[0];
        assert!(refiner_input.contains("stock_research_agent: ```json"));
        assert!(refiner_input.contains("portfolio_constructor_agent: {"));
    }

    #[test]
    fn test_blocking_run_matches_async() {
        let blocking = happy_stages().pipeline().advise_blocking(&profile()).unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let async_advice = rt.block_on(happy_stages().pipeline().advise(&profile())).unwrap();
        assert_eq!(blocking, async_advice);
    }

    #[test]
    fn test_invalid_profile_stops_before_any_stage() {
        let stages = happy_stages();
        let mut bad = profile();
        bad.risk_tolerance = 12;

        let err = stages.pipeline().advise_blocking(&bad).unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
        assert!(stages.profiler.opening_texts().is_empty());
    }

    #[test]
    fn test_unbalanced_draft_names_stage() {
        let stages = Stages {
            constructor: ScriptedRuntime::new([portfolio(&[("VOO", 50.0), ("BND", 30.0)])]),
            ..happy_stages()
        };

        let err = stages.pipeline().advise_blocking(&profile()).unwrap_err();
        assert!(matches!(
            &err,
            StockError::Validation(msg) if msg.starts_with("portfolio_constructor_agent:")
        ));
        assert!(stages.researcher.opening_texts().is_empty());
    }

    #[test]
    fn test_report_on_wrong_ticker_rejected() {
        let stages = Stages {
            researcher: ScriptedRuntime::new([report("MSFT", "Buy")]),
            ..happy_stages()
        };

        let err = stages.pipeline().advise_blocking(&profile()).unwrap_err();
        assert!(err.to_string().contains("asked for AAPL, got a report on MSFT"));
        assert!(stages.refiner.opening_texts().is_empty());
    }

    #[test]
    fn test_from_config_builds() {
        let config = ResearchConfig::builder().api_key("sk-test").build().unwrap();
        assert!(AdvisoryPipeline::from_config(&config).is_ok());
    }
}
