//! mail commands - send and list messages.

use anyhow::Result;
use serde_json::json;

use crate::api::ApiClient;
use crate::core::config::Config;
use crate::ui::output;

use super::super::Context;
use super::{finish_api_result, user_token_for_command};

/// Send a mail message.
pub fn send(ctx: &Context, to: &str, subject: &str, body: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut cfg = Config::load()?;
        let (account, token) = user_token_for_command(ctx, &mut cfg, "mail send", false).await?;

        let client = ApiClient::new(&cfg.doc.base_url);
        let payload = json!({ "to": to, "subject": subject, "body": body });
        let result = client
            .post("/open-apis/mail/v1/messages/send", &token, &payload)
            .await;
        let data = finish_api_result(result, &account, "mail send", false)?;

        output::print(
            format!(
                "Sent. message_id={}",
                data.get("message_id").and_then(|v| v.as_str()).unwrap_or("-")
            ),
            ctx.verbosity,
        );
        Ok(())
    })
}

/// List recent mail messages (read-only access).
pub fn list(ctx: &Context) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut cfg = Config::load()?;
        let (account, token) = user_token_for_command(ctx, &mut cfg, "mail list", true).await?;

        let client = ApiClient::new(&cfg.doc.base_url);
        let result = client.get("/open-apis/mail/v1/messages", &token).await;
        let data = finish_api_result(result, &account, "mail list", true)?;

        output::print(serde_json::to_string_pretty(&data)?, ctx.verbosity);
        Ok(())
    })
}
