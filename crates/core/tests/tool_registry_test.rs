// Integration tests for tool resolution and provider shaping
//
// Run with: cargo test -p mlagent-core --test tool_registry_test

use std::sync::Arc;

use mlagent_core::memory::{MockCompletionClient, MockCondenser};
use mlagent_core::provider_quirks::GEMINI_2_5_PRO_PREVIEW;
use mlagent_core::tools::{self, create_cmd_run_tool, finish_tool, EDIT_FILE};
use mlagent_core::{
    Agent, AgentConfig, AgentConfigBuilder, CompletionResponse, Event, LlmConfig, Platform,
    PromptManager, State, StepEngine, ToolDescriptor,
};

fn has_defaults(tools: &[ToolDescriptor]) -> bool {
    tools.iter().any(|t| {
        t.properties()
            .map(|props| props.values().any(|p| p.get("default").is_some()))
            .unwrap_or(false)
    })
}

#[test]
fn test_resolution_is_deterministic() {
    let config = AgentConfig::default();
    for model in ["gpt-4o", "claude-3-7-sonnet-20250219", "o3-mini"] {
        for platform in [Platform::Linux, Platform::Windows] {
            assert_eq!(
                tools::resolve(&config, model, platform),
                tools::resolve(&config, model, platform)
            );
        }
    }
}

#[test]
fn test_llm_editor_and_editor_yield_only_llm_editor() {
    let config = AgentConfigBuilder::new().llm_editor(true).editor(true).build();
    let tools = tools::resolve(&config, "claude-3-7-sonnet-20250219", Platform::Linux);
    let names = tools::tool_names(&tools);

    assert_eq!(names.iter().filter(|n| *n == EDIT_FILE).count(), 1);
    assert!(!names.iter().any(|n| n == "str_replace_editor"));
    assert_eq!(names.last().map(String::as_str), Some(EDIT_FILE));
}

#[test]
fn test_cmd_and_finish_for_gpt_4o() {
    let config = AgentConfigBuilder::none().cmd(true).finish(true).build();
    let tools = tools::resolve(&config, "gpt-4o", Platform::Linux);

    assert_eq!(tools, vec![create_cmd_run_tool(true), finish_tool()]);
}

#[tokio::test]
async fn test_quirk_strips_defaults_without_touching_cache() {
    let config = AgentConfigBuilder::none()
        .cmd(true)
        .finish(true)
        .llm_editor(true)
        .build();
    let client = MockCompletionClient::with_responses(vec![CompletionResponse::text("r", "ok")]);
    let mut engine = StepEngine::builder(config.clone(), LlmConfig::new(GEMINI_2_5_PRO_PREVIEW))
        .client(Arc::new(client.clone()))
        .prompt_manager(PromptManager::default())
        .condenser(Box::new(MockCondenser::passthrough()))
        .platform(Platform::Linux)
        .build()
        .unwrap();
    assert!(has_defaults(engine.tools()));

    engine
        .step(&State::with_history(vec![Event::user_message(0, "fit a model")]))
        .await
        .unwrap();

    let calls = client.calls().await;
    let sent = &calls[0].tools;
    assert!(!has_defaults(sent));
    assert_eq!(sent.len(), engine.tools().len());

    // Everything but the defaults is unchanged
    for (shaped, cached) in sent.iter().zip(engine.tools()) {
        assert_eq!(shaped.name, cached.name);
        assert_eq!(shaped.description, cached.description);
        assert_eq!(shaped.parameters["required"], cached.parameters["required"]);
    }

    // The cached list and a fresh resolution still carry the defaults
    assert!(has_defaults(engine.tools()));
    assert!(has_defaults(&tools::resolve(
        &config,
        GEMINI_2_5_PRO_PREVIEW,
        Platform::Linux
    )));
}

#[tokio::test]
async fn test_other_models_get_tools_unchanged() {
    let config = AgentConfigBuilder::none().llm_editor(true).build();
    let client = MockCompletionClient::with_responses(vec![CompletionResponse::text("r", "ok")]);
    let mut engine = StepEngine::builder(config, LlmConfig::new("gemini-2.5-pro"))
        .client(Arc::new(client.clone()))
        .prompt_manager(PromptManager::default())
        .platform(Platform::Linux)
        .build()
        .unwrap();

    engine
        .step(&State::with_history(vec![Event::user_message(0, "hi")]))
        .await
        .unwrap();

    assert_eq!(client.calls().await[0].tools, engine.tools());
}
