use axum::{extract::State, Json};
use std::sync::Arc;

use crate::codegen::CodeGenerator;
use crate::error::Result;
use crate::models::{CodeResponse, GenerateJourneyRequest, GenerateRequest};

use super::super::state::AppState;

/// Generate a script from an already coalesced action list
pub async fn generate_code(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<CodeResponse>> {
    let request: GenerateRequest = serde_json::from_str(&body)?;
    let generator = CodeGenerator::new(state.generator_options(request.options))?;
    let code = generator.generate(&request.actions)?;

    tracing::debug!("Generated code for {} actions", request.actions.len());
    Ok(Json(CodeResponse { code }))
}

/// Generate a script with one step block per journey step
pub async fn generate_journey_code(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<CodeResponse>> {
    let request: GenerateJourneyRequest = serde_json::from_str(&body)?;
    let generator = CodeGenerator::new(state.generator_options(request.options))?;
    let code = generator.generate_journey(&request.journey)?;

    tracing::debug!(
        "Generated code for journey with {} steps",
        request.journey.steps.len()
    );
    Ok(Json(CodeResponse { code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::AppError;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Config {
            journey_name: "Configured".to_string(),
            ..Config::default()
        }))
    }

    #[tokio::test]
    async fn test_generate_uses_configured_name() {
        let body = r##"{"actions":[{"pageAlias":"page","action":{"name":"check","selector":"#terms"}}]}"##;
        let Json(response) = generate_code(State(state()), body.to_string()).await.unwrap();
        assert!(response.code.contains("journey('Configured'"));
        assert!(response.code.contains("  await page.check('#terms');"));
    }

    #[tokio::test]
    async fn test_generate_with_explicit_options() {
        let body = r#"{
            "actions": [{"pageAlias":"tab","action":{"name":"navigate","url":"https://a.test"}}],
            "options": {"journeyName":"Explicit","pageAlias":"tab"}
        }"#;
        let Json(response) = generate_code(State(state()), body.to_string()).await.unwrap();
        assert!(response.code.contains("journey('Explicit', async ({ tab, context }) => {"));
    }

    #[tokio::test]
    async fn test_generate_journey_steps() {
        let body = r##"{"journey":{"steps":[
            {"name":"Go","actions":[{"pageAlias":"page","action":{"name":"navigate","url":"https://a.test"}}]}
        ]}}"##;
        let Json(response) = generate_journey_code(State(state()), body.to_string())
            .await
            .unwrap();
        assert!(response.code.contains("  step('Go', async () => {\n    await page.goto('https://a.test');\n  });"));
    }

    #[tokio::test]
    async fn test_blank_page_alias_is_rejected() {
        let body = r#"{"actions":[],"options":{"pageAlias":""}}"#;
        let err = generate_code(State(state()), body.to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::CodegenError(_)));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let body = r#"{"actions":[{"pageAlias":"page","action":{"name":"click"}}]}"#;
        let err = generate_code(State(state()), body.to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedAction(_)));
    }
}
