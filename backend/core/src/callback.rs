//! Inline-button payload codec.
//!
//! Telegram caps callback data at 64 bytes; `host_ninja_` plus a 32-char token stays well under.

use crate::types::Hosting;

const HOST_PREFIX: &str = "host_";

/// What an inline button asks for when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Pick a hosting; the token ties the choice back to a pending batch (or to nothing).
    ChooseHosting { hosting: Hosting, token: String },
    /// Open the hosting menu.
    HostingMenu,
    About,
    Back,
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            Self::ChooseHosting { hosting, token } => {
                format!("{HOST_PREFIX}{}_{token}", hosting.code())
            }
            Self::HostingMenu => "upload".to_string(),
            Self::About => "about".to_string(),
            Self::Back => "back".to_string(),
        }
    }

    /// Decode a payload. Anything unrecognised yields `None`.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "upload" => return Some(Self::HostingMenu),
            "about" => return Some(Self::About),
            "back" => return Some(Self::Back),
            _ => {}
        }
        let rest = data.strip_prefix(HOST_PREFIX)?;
        let (code, token) = rest.split_once('_')?;
        if token.is_empty() {
            return None;
        }
        Some(Self::ChooseHosting {
            hosting: Hosting::from_code(code)?,
            token: token.to_string(),
        })
    }
}
