use crate::error::{AppError, Result};
use crate::models::{ActionInContext, ActionKind, AssertCommand, Modifiers, MouseButton};

/// Pages the driver opens before any real navigation
const PLACEHOLDER_URLS: &[&str] = &[
    "about:blank",
    "about:newtab",
    "chrome://newtab/",
    "chrome://new-tab-page/",
];

/// Single-quoted string literal with JSON escaping
pub fn quote(text: &str) -> String {
    let json = serde_json::Value::String(text.to_string()).to_string();
    let inner = json[1..json.len() - 1].replace("\\\"", "\"");
    format!("'{}'", inner.replace('\'', "\\'"))
}

/// A string when there is exactly one value, an array otherwise
fn quote_one_or_many(values: &[String]) -> String {
    match values {
        [single] => quote(single),
        _ => quote_array(values.iter().map(String::as_str)),
    }
}

fn quote_array<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<String> = values.map(quote).collect();
    format!("[{}]", items.join(", "))
}

/// Multi-line object literal; the formatter re-indents its body
fn object_literal(fields: &[(&str, String)]) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("  {}: {}", key, value))
        .collect();
    format!("{{\n{}\n}}", body.join(",\n"))
}

/// Trailing options argument, empty when every option is default
fn options_argument(fields: &[(&str, String)]) -> String {
    if fields.is_empty() {
        String::new()
    } else {
        format!(", {}", object_literal(fields))
    }
}

pub fn is_meaningful_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && !PLACEHOLDER_URLS.contains(&url)
}

/// Expression addressing the page or frame the action targets
pub fn subject(action: &ActionInContext) -> String {
    let page = &action.page_alias;
    if action.is_main_frame {
        return page.clone();
    }

    let locator = match (&action.frame_name, &action.frame_url) {
        (Some(name), _) if !name.is_empty() => ("name", quote(name)),
        (_, url) => ("url", quote(url.as_deref().unwrap_or_default())),
    };
    format!("{}.frame({})", page, object_literal(&[locator]))
}

pub fn goto(url: &str) -> String {
    format!("goto({})", quote(url))
}

fn shortcut(modifiers: Modifiers, key: &str) -> String {
    let mut keys: Vec<&str> = modifiers.names();
    keys.push(key);
    keys.join("+")
}

/// Method call performing the action on its subject
pub fn action_call(kind: &ActionKind) -> Result<String> {
    let call = match kind {
        ActionKind::Navigate { url } => goto(url),
        ActionKind::Click {
            selector,
            click_count,
            button,
            modifiers,
        } => {
            let method = if *click_count == 2 { "dblclick" } else { "click" };
            let mut options: Vec<(&str, String)> = Vec::new();
            if *button != MouseButton::Left {
                options.push(("button", quote(button.as_str())));
            }
            if !modifiers.is_empty() {
                options.push(("modifiers", quote_array(modifiers.names().into_iter())));
            }
            if *click_count > 2 {
                options.push(("clickCount", click_count.to_string()));
            }
            format!("{}({}{})", method, quote(selector), options_argument(&options))
        }
        ActionKind::Fill { selector, text } => format!("fill({}, {})", quote(selector), quote(text)),
        ActionKind::Check { selector } => format!("check({})", quote(selector)),
        ActionKind::Uncheck { selector } => format!("uncheck({})", quote(selector)),
        ActionKind::Press {
            selector,
            key,
            modifiers,
        } => format!(
            "press({}, {})",
            quote(selector),
            quote(&shortcut(*modifiers, key))
        ),
        ActionKind::Select { selector, options } => format!(
            "selectOption({}, {})",
            quote(selector),
            quote_one_or_many(options)
        ),
        ActionKind::SetInputFiles { selector, files } => format!(
            "setInputFiles({}, {})",
            quote(selector),
            quote_one_or_many(files)
        ),
        ActionKind::OpenPage { .. } | ActionKind::ClosePage { .. } | ActionKind::Assert { .. } => {
            return Err(AppError::CodegenError(format!(
                "{} has no action call template",
                kind.name()
            )));
        }
    };
    Ok(call)
}

/// Assertion expression; it awaits its own query so needs no `await` prefix
pub fn assertion(
    subject: &str,
    command: AssertCommand,
    selector: &str,
    value: Option<&str>,
) -> Result<String> {
    let query = format!("await {}.{}({})", subject, command.as_str(), quote(selector));
    if !command.expects_value() {
        return Ok(format!("expect({}).toBeTruthy()", query));
    }
    let value = value.ok_or_else(|| {
        AppError::CodegenError(format!("{} assertion requires a value", command.as_str()))
    })?;
    Ok(format!("expect({}).toBe({})", query, quote(value)))
}

/// One-shot listener that logs and dismisses the next dialog on `page`
pub fn dialog_listener(page: &str) -> String {
    format!(
        "{}.once('dialog', dialog => {{\n\
         console.log(`Dialog message: ${{dialog.message()}}`);\n\
         dialog.dismiss().catch(() => {{}});\n\
         }});",
        page
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Action;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r#"say "hi""#), r#"'say "hi"'"#);
        assert_eq!(quote("a\nb"), r"'a\nb'");
        assert_eq!(quote(r"C:\tmp"), r"'C:\\tmp'");
    }

    #[test]
    fn test_placeholder_urls() {
        assert!(!is_meaningful_url("about:blank"));
        assert!(!is_meaningful_url("chrome://newtab/"));
        assert!(!is_meaningful_url("  "));
        assert!(is_meaningful_url("https://shop.test"));
    }

    #[test]
    fn test_click_variants() {
        assert_eq!(action_call(&Action::click("#a").kind).unwrap(), "click('#a')");
        assert_eq!(
            action_call(&Action::click_with_count("#a", 2).kind).unwrap(),
            "dblclick('#a')"
        );
        assert_eq!(
            action_call(&Action::click_with_count("#a", 3).kind).unwrap(),
            "click('#a', {\n  clickCount: 3\n})"
        );
        assert_eq!(
            action_call(&ActionKind::Click {
                selector: "#a".to_string(),
                click_count: 1,
                button: MouseButton::Right,
                modifiers: Modifiers(Modifiers::SHIFT | Modifiers::CONTROL),
            })
            .unwrap(),
            "click('#a', {\n  button: 'right',\n  modifiers: ['Control', 'Shift']\n})"
        );
    }

    #[test]
    fn test_fixed_shape_calls() {
        assert_eq!(
            action_call(&Action::fill("#q", "shoes").kind).unwrap(),
            "fill('#q', 'shoes')"
        );
        assert_eq!(action_call(&Action::check("#t").kind).unwrap(), "check('#t')");
        assert_eq!(action_call(&Action::uncheck("#t").kind).unwrap(), "uncheck('#t')");
        assert_eq!(
            action_call(&ActionKind::Press {
                selector: "#q".to_string(),
                key: "Enter".to_string(),
                modifiers: Modifiers(Modifiers::META),
            })
            .unwrap(),
            "press('#q', 'Meta+Enter')"
        );
        assert_eq!(
            action_call(&Action::select("#size", &["m"]).kind).unwrap(),
            "selectOption('#size', 'm')"
        );
        assert_eq!(
            action_call(&Action::select("#size", &["m", "l"]).kind).unwrap(),
            "selectOption('#size', ['m', 'l'])"
        );
        assert_eq!(
            action_call(&Action::set_input_files("#f", &[]).kind).unwrap(),
            "setInputFiles('#f', [])"
        );
        assert_eq!(
            action_call(&Action::navigate("https://shop.test").kind).unwrap(),
            "goto('https://shop.test')"
        );
        assert!(action_call(&Action::open_page(None).kind).is_err());
    }

    #[test]
    fn test_subject_resolution() {
        let main = ActionInContext::new("page", Action::click("a"));
        assert_eq!(subject(&main), "page");

        let named = ActionInContext::in_frame("page", Some("pay"), Some("https://pay.test"), Action::click("a"));
        assert_eq!(subject(&named), "page.frame({\n  name: 'pay'\n})");

        let by_url = ActionInContext::in_frame("page1", None, Some("https://pay.test"), Action::click("a"));
        assert_eq!(subject(&by_url), "page1.frame({\n  url: 'https://pay.test'\n})");

        // A blank name falls back to the url
        let blank_name = ActionInContext::in_frame("page", Some(""), Some("https://pay.test"), Action::click("a"));
        assert_eq!(subject(&blank_name), "page.frame({\n  url: 'https://pay.test'\n})");

        let unresolved = ActionInContext::in_frame("page", None, None, Action::click("a"));
        assert_eq!(subject(&unresolved), "page.frame({\n  url: ''\n})");
    }

    #[test]
    fn test_assertions() {
        assert_eq!(
            assertion("page", AssertCommand::IsVisible, "#cart", None).unwrap(),
            "expect(await page.isVisible('#cart')).toBeTruthy()"
        );
        assert_eq!(
            assertion("page", AssertCommand::TextContent, "h1", Some("Shop")).unwrap(),
            "expect(await page.textContent('h1')).toBe('Shop')"
        );
        assert!(assertion("page", AssertCommand::InnerText, "h1", None).is_err());
    }
}
