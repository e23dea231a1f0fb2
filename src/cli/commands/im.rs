//! im commands - send chat messages.

use anyhow::Result;
use serde_json::json;

use crate::api::ApiClient;
use crate::core::config::Config;
use crate::ui::output;

use super::super::Context;
use super::{finish_api_result, user_token_for_command};

/// Send a chat message.
pub fn send(ctx: &Context, chat: &str, text: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut cfg = Config::load()?;
        let (account, token) = user_token_for_command(ctx, &mut cfg, "im send", false).await?;

        let client = ApiClient::new(&cfg.doc.base_url);
        let payload = json!({ "chat_id": chat, "text": text });
        let result = client
            .post("/open-apis/im/v1/messages", &token, &payload)
            .await;
        let data = finish_api_result(result, &account, "im send", false)?;

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
