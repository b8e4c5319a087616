use crate::error::{AppError, Result};
use crate::models::Signal;

/// An action's signals sorted into the slots statement generation cares about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalSet<'a> {
    /// Navigation the statement has to wait for
    pub async_navigation: Option<&'a str>,
    /// Navigation that already happened; asserted after the statement
    pub assert_navigation: Option<&'a str>,
    pub popup: Option<&'a str>,
    pub download: bool,
    pub dialog: bool,
}

impl<'a> SignalSet<'a> {
    pub fn classify(signals: &'a [Signal]) -> Result<Self> {
        let mut set = SignalSet::default();

        for signal in signals {
            let duplicate = match signal {
                Signal::Navigation { url, is_async } => {
                    let taken = set.async_navigation.is_some() || set.assert_navigation.is_some();
                    if *is_async {
                        set.async_navigation = Some(url.as_str());
                    } else {
                        set.assert_navigation = Some(url.as_str());
                    }
                    taken
                }
                Signal::Popup { popup_alias } => set.popup.replace(popup_alias.as_str()).is_some(),
                Signal::Download => std::mem::replace(&mut set.download, true),
                Signal::Dialog => std::mem::replace(&mut set.dialog, true),
            };

            if duplicate {
                return Err(AppError::CodegenError(format!(
                    "more than one {} signal on one action",
                    signal.name()
                )));
            }
        }

        Ok(set)
    }

    /// Whether the statement must run inside a concurrent wait
    pub fn needs_concurrent_wait(&self) -> bool {
        self.popup.is_some() || self.async_navigation.is_some() || self.download
    }

    /// Variable the concurrent wait binds its result to, if any
    pub fn binding(&self) -> Option<&'a str> {
        match (self.popup, self.download) {
            (Some(alias), _) => Some(alias),
            (None, true) => Some("download"),
            (None, false) => None,
        }
    }
}
