use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Mouse button used for a recorded click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
        }
    }
}

/// Keyboard modifier bitmask as reported by the automation driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const ALT: u8 = 1;
    pub const CONTROL: u8 = 2;
    pub const META: u8 = 4;
    pub const SHIFT: u8 = 8;

    const ALL: u8 = Self::ALT | Self::CONTROL | Self::META | Self::SHIFT;

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Modifier names in rendering order (Alt, Control, Meta, Shift)
    pub fn names(&self) -> Vec<&'static str> {
        [
            (Self::ALT, "Alt"),
            (Self::CONTROL, "Control"),
            (Self::META, "Meta"),
            (Self::SHIFT, "Shift"),
        ]
        .into_iter()
        .filter(|(bit, _)| self.0 & bit != 0)
        .map(|(_, name)| name)
        .collect()
    }

    fn has_unknown_bits(&self) -> bool {
        self.0 & !Self::ALL != 0
    }
}

/// Query used by an `assert` action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertCommand {
    IsVisible,
    IsHidden,
    IsChecked,
    IsEditable,
    IsEnabled,
    IsDisabled,
    TextContent,
    InnerText,
}

impl AssertCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssertCommand::IsVisible => "isVisible",
            AssertCommand::IsHidden => "isHidden",
            AssertCommand::IsChecked => "isChecked",
            AssertCommand::IsEditable => "isEditable",
            AssertCommand::IsEnabled => "isEnabled",
            AssertCommand::IsDisabled => "isDisabled",
            AssertCommand::TextContent => "textContent",
            AssertCommand::InnerText => "innerText",
        }
    }

    /// Text queries compare against an expected value, boolean ones don't
    pub fn expects_value(&self) -> bool {
        matches!(self, AssertCommand::TextContent | AssertCommand::InnerText)
    }
}

/// The kind-specific payload of a recorded action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActionKind {
    Navigate {
        url: String,
    },
    Click {
        selector: String,
        #[serde(default = "default_click_count")]
        click_count: u32,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Fill {
        selector: String,
        #[serde(alias = "value")]
        text: String,
    },
    Check {
        selector: String,
    },
    Uncheck {
        selector: String,
    },
    Press {
        selector: String,
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Select {
        selector: String,
        options: Vec<String>,
    },
    SetInputFiles {
        selector: String,
        files: Vec<String>,
    },
    OpenPage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    ClosePage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Assert {
        command: AssertCommand,
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

fn default_click_count() -> u32 {
    1
}

impl ActionKind {
    /// Wire name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Navigate { .. } => "navigate",
            ActionKind::Click { .. } => "click",
            ActionKind::Fill { .. } => "fill",
            ActionKind::Check { .. } => "check",
            ActionKind::Uncheck { .. } => "uncheck",
            ActionKind::Press { .. } => "press",
            ActionKind::Select { .. } => "select",
            ActionKind::SetInputFiles { .. } => "setInputFiles",
            ActionKind::OpenPage { .. } => "openPage",
            ActionKind::ClosePage { .. } => "closePage",
            ActionKind::Assert { .. } => "assert",
        }
    }

    /// Target element selector, for kinds that act on an element
    pub fn selector(&self) -> Option<&str> {
        match self {
            ActionKind::Click { selector, .. }
            | ActionKind::Fill { selector, .. }
            | ActionKind::Check { selector }
            | ActionKind::Uncheck { selector }
            | ActionKind::Press { selector, .. }
            | ActionKind::Select { selector, .. }
            | ActionKind::SetInputFiles { selector, .. }
            | ActionKind::Assert { selector, .. } => Some(selector),
            ActionKind::Navigate { .. }
            | ActionKind::OpenPage { .. }
            | ActionKind::ClosePage { .. } => None,
        }
    }
}

/// Asynchronous side effect observed while an action was performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Signal {
    Navigation {
        url: String,
        #[serde(default)]
        is_async: bool,
    },
    Popup {
        popup_alias: String,
    },
    Download,
    Dialog,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Navigation { .. } => "navigation",
            Signal::Popup { .. } => "popup",
            Signal::Download => "download",
            Signal::Dialog => "dialog",
        }
    }
}

/// One recorded interaction together with the signals it triggered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub is_assert: bool,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        let is_assert = matches!(kind, ActionKind::Assert { .. });
        Self {
            kind,
            signals: Vec::new(),
            is_assert,
        }
    }

    /// Create a navigate action
    pub fn navigate(url: &str) -> Self {
        Self::new(ActionKind::Navigate {
            url: url.to_string(),
        })
    }

    /// Create a single left click
    pub fn click(selector: &str) -> Self {
        Self::click_with_count(selector, 1)
    }

    /// Create a left click with an explicit click count
    pub fn click_with_count(selector: &str, click_count: u32) -> Self {
        Self::new(ActionKind::Click {
            selector: selector.to_string(),
            click_count,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        })
    }

    /// Create a fill action
    pub fn fill(selector: &str, text: &str) -> Self {
        Self::new(ActionKind::Fill {
            selector: selector.to_string(),
            text: text.to_string(),
        })
    }

    pub fn check(selector: &str) -> Self {
        Self::new(ActionKind::Check {
            selector: selector.to_string(),
        })
    }

    pub fn uncheck(selector: &str) -> Self {
        Self::new(ActionKind::Uncheck {
            selector: selector.to_string(),
        })
    }

    /// Create a key press without modifiers
    pub fn press(selector: &str, key: &str) -> Self {
        Self::new(ActionKind::Press {
            selector: selector.to_string(),
            key: key.to_string(),
            modifiers: Modifiers::default(),
        })
    }

    pub fn select(selector: &str, options: &[&str]) -> Self {
        Self::new(ActionKind::Select {
            selector: selector.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        })
    }

    pub fn set_input_files(selector: &str, files: &[&str]) -> Self {
        Self::new(ActionKind::SetInputFiles {
            selector: selector.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        })
    }

    pub fn open_page(url: Option<&str>) -> Self {
        Self::new(ActionKind::OpenPage {
            url: url.map(|u| u.to_string()),
        })
    }

    pub fn close_page(url: Option<&str>) -> Self {
        Self::new(ActionKind::ClosePage {
            url: url.map(|u| u.to_string()),
        })
    }

    pub fn assert(command: AssertCommand, selector: &str, value: Option<&str>) -> Self {
        Self::new(ActionKind::Assert {
            command,
            selector: selector.to_string(),
            value: value.map(|v| v.to_string()),
        })
    }

    /// Attach a signal, builder style
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_assertion(&self) -> bool {
        self.is_assert || matches!(self.kind, ActionKind::Assert { .. })
    }

    /// Human-readable label, used for default step names and logging
    pub fn title(&self) -> String {
        match &self.kind {
            ActionKind::Navigate { url } => format!("Navigate to {}", truncate(url, 60)),
            ActionKind::Click {
                selector,
                click_count,
                button,
                ..
            } => {
                let verb = match (button, click_count) {
                    (MouseButton::Right, _) => "Right click".to_string(),
                    (MouseButton::Middle, _) => "Middle click".to_string(),
                    (_, 1) => "Click".to_string(),
                    (_, 2) => "Double click".to_string(),
                    (_, n) => format!("Click {} times on", n),
                };
                format!("{} {}", verb, truncate(selector, 40))
            }
            ActionKind::Fill { selector, text } => {
                format!("Fill '{}' into {}", truncate(text, 30), truncate(selector, 40))
            }
            ActionKind::Check { selector } => format!("Check {}", truncate(selector, 40)),
            ActionKind::Uncheck { selector } => format!("Uncheck {}", truncate(selector, 40)),
            ActionKind::Press { key, modifiers, .. } => {
                let mut keys: Vec<&str> = modifiers.names();
                keys.push(key.as_str());
                format!("Press {}", keys.join("+"))
            }
            ActionKind::Select { options, .. } => format!("Select {}", options.join(", ")),
            ActionKind::SetInputFiles { files, .. } => match files.len() {
                0 => "Clear selected files".to_string(),
                1 => format!("Upload {}", files[0]),
                n => format!("Upload {} files", n),
            },
            ActionKind::OpenPage { .. } => "Open new page".to_string(),
            ActionKind::ClosePage { .. } => "Close page".to_string(),
            ActionKind::Assert {
                command, selector, ..
            } => format!("Assert {} {}", command.as_str(), truncate(selector, 40)),
        }
    }

    /// Reject actions the driver should never have produced
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            ActionKind::Navigate { url } if url.trim().is_empty() => {
                return Err(malformed(self, "url must not be empty"));
            }
            ActionKind::Click { click_count: 0, .. } => {
                return Err(malformed(self, "clickCount must be at least 1"));
            }
            ActionKind::Press { key, .. } if key.is_empty() => {
                return Err(malformed(self, "key must not be empty"));
            }
            ActionKind::Assert {
                command,
                value: None,
                ..
            } if command.expects_value() => {
                return Err(malformed(
                    self,
                    &format!("{} assertion requires a value", command.as_str()),
                ));
            }
            _ => {}
        }

        if let Some(selector) = self.kind.selector() {
            if selector.trim().is_empty() {
                return Err(malformed(self, "selector must not be empty"));
            }
        }

        let modifiers = match &self.kind {
            ActionKind::Click { modifiers, .. } | ActionKind::Press { modifiers, .. } => *modifiers,
            _ => Modifiers::default(),
        };
        if modifiers.has_unknown_bits() {
            return Err(malformed(self, &format!("unknown modifier bits {:#x}", modifiers.0)));
        }

        if self.is_assert && !matches!(self.kind, ActionKind::Assert { .. }) {
            return Err(malformed(self, "isAssert is only valid on assert actions"));
        }

        let mut seen: Vec<&'static str> = Vec::with_capacity(self.signals.len());
        for signal in &self.signals {
            if seen.contains(&signal.name()) {
                return Err(malformed(
                    self,
                    &format!("more than one {} signal", signal.name()),
                ));
            }
            seen.push(signal.name());

            match signal {
                Signal::Popup { popup_alias } if popup_alias.trim().is_empty() => {
                    return Err(malformed(self, "popup signal requires an alias"));
                }
                Signal::Navigation { url, .. } if url.trim().is_empty() => {
                    return Err(malformed(self, "navigation signal requires a url"));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn malformed(action: &Action, reason: &str) -> AppError {
    AppError::MalformedAction(format!("{}: {}", action.name(), reason))
}

fn default_true() -> bool {
    true
}

/// An action plus the page and frame it was performed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInContext {
    pub page_alias: String,
    #[serde(default = "default_true")]
    pub is_main_frame: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_name: Option<String>,
    pub action: Action,
}

impl ActionInContext {
    /// Action performed in the main frame of `page_alias`
    pub fn new(page_alias: &str, action: Action) -> Self {
        Self {
            page_alias: page_alias.to_string(),
            is_main_frame: true,
            frame_url: None,
            frame_name: None,
            action,
        }
    }

    /// Action performed in a child frame of `page_alias`
    pub fn in_frame(
        page_alias: &str,
        frame_name: Option<&str>,
        frame_url: Option<&str>,
        action: Action,
    ) -> Self {
        Self {
            page_alias: page_alias.to_string(),
            is_main_frame: false,
            frame_url: frame_url.map(|u| u.to_string()),
            frame_name: frame_name.map(|n| n.to_string()),
            action,
        }
    }

    /// Decode one driver event and check it is well formed
    pub fn from_json(payload: &str) -> Result<Self> {
        let event: ActionInContext = serde_json::from_str(payload)?;
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_alias.trim().is_empty() {
            return Err(AppError::MalformedAction(format!(
                "{}: pageAlias must not be empty",
                self.action.name()
            )));
        }
        self.action.validate()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
