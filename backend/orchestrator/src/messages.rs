//! User-facing reply texts. All text is Telegram HTML.

use photodrop_core::{escape_html, Button, CallbackAction, Hosting, Reply};

use crate::orchestrator::UploadOutcome;

const GREETING: &str = "<b>👋 Hi there!</b>\n\n\
    Send me a photo and I will upload it to the hosting of your choice, fast and anonymously 🥷🏻.";

pub fn start_greeting() -> Reply {
    Reply::html(GREETING)
        .with_row(vec![Button::new("ℹ️ Why us?", CallbackAction::About)])
        .with_row(vec![Button::new("📤 Upload photo", CallbackAction::HostingMenu)])
}

pub fn help() -> Reply {
    Reply::html(
        "<b>ℹ️ Commands:</b>\n\
         /start — start the bot\n\
         /help — show this help",
    )
}

pub fn about() -> Reply {
    let text = format!(
        "<b>🥷🏻 Why us?</b>\n\n\
         1️⃣ Files are not stored on our side.\n\
         2️⃣ No registration.\n\
         3️⃣ Automatic deletion: {} days ({}) or {} days ({}).",
        Hosting::Anoimage.retention_days(),
        Hosting::Anoimage.display_name(),
        Hosting::Ninjabox.retention_days(),
        Hosting::Ninjabox.display_name(),
    );
    Reply::html(text)
        .with_row(vec![Button::new("🔙 Back", CallbackAction::Back)])
        .with_row(vec![Button::new("📤 Upload photo", CallbackAction::HostingMenu)])
}

pub fn duplicate_warning() -> Reply {
    Reply::html("❗️ This photo was already uploaded a few minutes ago, skipping the duplicate.")
}

fn with_hosting_buttons(reply: Reply, token: &str) -> Reply {
    Hosting::ALL.into_iter().fold(reply, |reply, hosting| {
        reply.with_row(vec![Button::new(
            format!("{} ({} days)", hosting.site(), hosting.retention_days()),
            CallbackAction::ChooseHosting {
                hosting,
                token: token.to_string(),
            },
        )])
    })
}

/// Asked when photos arrive before any hosting was chosen.
pub fn hosting_prompt(token: &str) -> Reply {
    with_hosting_buttons(Reply::html("<b>Choose a hosting for the upload:</b>"), token)
}

/// Opened from the "Upload photo" / "Change hosting" buttons.
pub fn hosting_menu(token: &str) -> Reply {
    with_hosting_buttons(Reply::html("<b>Pick the hosting you like:</b>"), token)
}

pub fn token_expired(token: &str) -> Reply {
    with_hosting_buttons(
        Reply::html("⌛ That choice is no longer valid. <b>Pick a hosting again:</b>"),
        token,
    )
}

pub fn selection_confirmed(hosting: Hosting) -> Reply {
    Reply::html(format!(
        "Selected {} (retention: {} days).\n\
         📸 Now send me a photo or an album (up to 10 at once).",
        hosting.display_name(),
        hosting.retention_days()
    ))
    .with_row(vec![Button::new("🔄 Change hosting", CallbackAction::HostingMenu)])
}

/// One line for a single item, a numbered list for a batch. Failures are listed in place.
pub fn upload_results(hosting: Hosting, outcomes: &[UploadOutcome]) -> Reply {
    let name = hosting.display_name();
    let text = match outcomes {
        [only] => match &only.result {
            Ok(url) => format!("✅ <b>Your link on {name}:</b> {}", escape_html(url)),
            Err(err) => format!(
                "❌ <b>Upload to {name} failed:</b> {}",
                escape_html(&err.to_string())
            ),
        },
        many => {
            let lines: Vec<String> = many
                .iter()
                .enumerate()
                .map(|(i, outcome)| match &outcome.result {
                    Ok(url) => format!("{}: {}", i + 1, escape_html(url)),
                    Err(err) => format!("{}: ❌ Error: {}", i + 1, escape_html(&err.to_string())),
                })
                .collect();
            format!("<b>✅ Batch upload to {name} finished:</b>\n{}", lines.join("\n"))
        }
    };
    Reply::html(text).with_row(vec![Button::new(
        "🔙 Back to hosting choice",
        CallbackAction::HostingMenu,
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use photodrop_core::{ImageIdentity, UploadError};

    fn ok(id: &str, url: &str) -> UploadOutcome {
        UploadOutcome {
            identity: ImageIdentity::new(id),
            result: Ok(url.to_string()),
        }
    }

    #[test]
    fn single_result_is_one_line() {
        let reply = upload_results(Hosting::Anoimage, &[ok("p1", "https://anoimage.com/12345")]);
        assert_eq!(
            reply.text,
            "✅ <b>Your link on Anoimage:</b> https://anoimage.com/12345"
        );
        assert_eq!(reply.actions().collect::<Vec<_>>(), vec![&CallbackAction::HostingMenu]);
    }

    #[test]
    fn batch_lists_failures_inline() {
        let failed = UploadOutcome {
            identity: ImageIdentity::new("p2"),
            result: Err(UploadError::Timeout),
        };
        let reply = upload_results(
            Hosting::Ninjabox,
            &[ok("p1", "https://nbox.me/ab-12"), failed],
        );
        let lines: Vec<_> = reply.text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1: https://nbox.me/ab-12");
        assert_eq!(lines[2], "2: ❌ Error: timeout");
    }

    #[test]
    fn error_text_is_escaped() {
        let failed = UploadOutcome {
            identity: ImageIdentity::new("p1"),
            result: Err(UploadError::parse("no link", "<html>")),
        };
        let reply = upload_results(Hosting::Ninjabox, &[failed]);
        assert!(reply.text.contains("&lt;html&gt;"));
    }

    #[test]
    fn hosting_buttons_carry_token() {
        let reply = hosting_prompt("abc");
        let labels: Vec<_> = reply.buttons.iter().flatten().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Anoimage.com (120 days)", "Ninjabox.org (180 days)"]);
        assert!(reply.actions().all(|a| matches!(
            a,
            CallbackAction::ChooseHosting { token, .. } if token == "abc"
        )));
    }
}
