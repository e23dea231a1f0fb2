//! contact commands - look up contacts.

use anyhow::Result;

use crate::api::ApiClient;
use crate::core::config::Config;
use crate::ui::output;

use super::super::Context;
use super::{finish_api_result, user_token_for_command};

/// List contacts (read-only access).
pub fn list(ctx: &Context) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut cfg = Config::load()?;
        let (account, token) = user_token_for_command(ctx, &mut cfg, "contact list", true).await?;

        let client = ApiClient::new(&cfg.doc.base_url);
        let result = client.get("/open-apis/contact/v1/users", &token).await;
        let data = finish_api_result(result, &account, "contact list", true)?;

        output::print(serde_json::to_string_pretty(&data)?, ctx.verbosity);
        Ok(())
    })
}
