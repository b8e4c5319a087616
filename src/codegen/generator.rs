use serde::{Deserialize, Serialize};

use super::formatter::LineFormatter;
use super::signals::SignalSet;
use super::templates;
use crate::error::{AppError, Result};
use crate::models::{ActionInContext, ActionKind, Journey};

/// Indent of statements directly inside the journey body
const JOURNEY_BODY_OFFSET: usize = 2;
/// Indent of statements inside a step block
const STEP_BODY_OFFSET: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorOptions {
    pub journey_name: String,
    pub page_alias: String,
    pub context_alias: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            journey_name: "Recorded journey".to_string(),
            page_alias: "page".to_string(),
            context_alias: "context".to_string(),
        }
    }
}

/// How a concurrent wait binds its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// `const [x] = ...`, the variable lives in the statement's scope
    Declare,
    /// `[x] = ...`, the variable was declared once at the top of the journey
    Assign,
}

/// Turns a finished action list into a journey script.
///
/// Generation is a pure function of its input: the generator holds only
/// options and can be called repeatedly on growing prefixes.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    options: GeneratorOptions,
}

impl CodeGenerator {
    /// Generator for `options`; both aliases end up as header parameters
    pub fn new(options: GeneratorOptions) -> Result<Self> {
        for (field, alias) in [
            ("pageAlias", &options.page_alias),
            ("contextAlias", &options.context_alias),
        ] {
            if alias.trim().is_empty() {
                return Err(AppError::CodegenError(format!("{} must not be empty", field)));
            }
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn header(&self) -> String {
        self.header_named(&self.options.journey_name)
    }

    fn header_named(&self, journey_name: &str) -> String {
        let mut formatter = LineFormatter::new();
        formatter.add("const { journey, step, expect } = require('@elastic/synthetics');");
        formatter.new_line();
        formatter.add(&format!(
            "journey({}, async ({{ {}, {} }}) => {{",
            templates::quote(journey_name),
            self.options.page_alias,
            self.options.context_alias
        ));
        formatter.format()
    }

    pub fn footer(&self) -> String {
        "});".to_string()
    }

    /// Header, one block per action that produces code, footer
    pub fn generate(&self, actions: &[ActionInContext]) -> Result<String> {
        let mut parts = vec![self.header()];
        for action in actions {
            if let Some(statement) = self.render(action, JOURNEY_BODY_OFFSET, Binding::Declare)? {
                parts.push(statement);
            }
        }
        parts.push(self.footer());

        tracing::debug!("Generated journey from {} actions", actions.len());
        Ok(parts.join("\n"))
    }

    /// Statements for a single action, indented for the journey body
    pub fn generate_action(&self, action: &ActionInContext) -> Result<String> {
        Ok(self
            .render(action, JOURNEY_BODY_OFFSET, Binding::Declare)?
            .unwrap_or_default())
    }

    /// Journey with one `step(...)` block per non-empty step.
    ///
    /// Popup and download variables are declared once after the header since
    /// a later step may use a page opened by an earlier one.
    pub fn generate_journey(&self, journey: &Journey) -> Result<String> {
        let journey_name = journey
            .name
            .as_deref()
            .unwrap_or(&self.options.journey_name);
        let mut parts = vec![self.header_named(journey_name)];

        let hoisted = hoisted_bindings(journey)?;
        if !hoisted.is_empty() {
            let mut declaration = LineFormatter::with_offset(JOURNEY_BODY_OFFSET);
            declaration.add(&format!("let {};", hoisted.join(", ")));
            parts.push(declaration.format());
        }

        for step in journey.steps.iter().filter(|s| !s.is_empty()) {
            let mut body = Vec::with_capacity(step.actions.len());
            for action in &step.actions {
                if let Some(statement) = self.render(action, STEP_BODY_OFFSET, Binding::Assign)? {
                    body.push(statement);
                }
            }
            if body.is_empty() {
                continue;
            }

            let mut open = LineFormatter::with_offset(JOURNEY_BODY_OFFSET);
            open.add(&format!("step({}, async () => {{", templates::quote(&step.name)));
            let mut close = LineFormatter::with_offset(JOURNEY_BODY_OFFSET);
            close.add("});");

            parts.push(open.format());
            parts.extend(body);
            parts.push(close.format());
        }
        parts.push(self.footer());

        tracing::debug!(
            "Generated journey from {} steps ({} actions)",
            journey.steps.len(),
            journey.action_count()
        );
        Ok(parts.join("\n"))
    }

    /// Statements for one action, `None` when it produces no code
    fn render(
        &self,
        context: &ActionInContext,
        offset: usize,
        binding: Binding,
    ) -> Result<Option<String>> {
        context.validate()?;

        let action = &context.action;
        let page = &context.page_alias;
        let mut formatter = LineFormatter::with_offset(offset);

        if let ActionKind::OpenPage { url } | ActionKind::ClosePage { url } = &action.kind {
            if let Some(url) = url.as_deref().filter(|u| templates::is_meaningful_url(u)) {
                formatter.add(&format!("await {}.{};", page, templates::goto(url)));
            }
            return Ok(finish(formatter));
        }

        let subject = templates::subject(context);
        let signals = SignalSet::classify(&action.signals)?;

        if signals.dialog {
            formatter.add(&templates::dialog_listener(page));
        }

        let call = match &action.kind {
            ActionKind::Assert {
                command,
                selector,
                value,
            } => templates::assertion(&subject, *command, selector, value.as_deref())?,
            kind => format!("{}.{}", subject, templates::action_call(kind)?),
        };

        if signals.needs_concurrent_wait() {
            let target = match (signals.binding(), binding) {
                (Some(name), Binding::Declare) => format!("const [{}] = ", name),
                (Some(name), Binding::Assign) => format!("[{}] = ", name),
                (None, _) => String::new(),
            };
            formatter.add(&format!("{}await Promise.all([", target));
            if signals.popup.is_some() {
                formatter.add(&format!("{}.waitForEvent('popup'),", page));
            }
            if let Some(url) = signals.async_navigation {
                formatter.add(&format!(
                    "{}.waitForNavigation({{ url: {} }}),",
                    page,
                    templates::quote(url)
                ));
            }
            if signals.download {
                formatter.add(&format!("{}.waitForEvent('download'),", page));
            }
            formatter.add(&call);
            formatter.add("]);");
        } else {
            // Assertion templates await their own query
            let prefix = if action.is_assertion() { "" } else { "await " };
            formatter.add(&format!("{}{};", prefix, call));
            if let Some(url) = signals.assert_navigation {
                formatter.add(&format!(
                    "expect({}.url()).toBe({});",
                    subject,
                    templates::quote(url)
                ));
            }
        }

        Ok(finish(formatter))
    }
}

fn finish(formatter: LineFormatter) -> Option<String> {
    if formatter.is_empty() {
        None
    } else {
        Some(formatter.format())
    }
}

/// Variables bound by concurrent waits, in first-use order
fn hoisted_bindings(journey: &Journey) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for context in journey.actions() {
        context.validate()?;
        let signals = SignalSet::classify(&context.action.signals)?;
        if let Some(name) = signals.binding() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
