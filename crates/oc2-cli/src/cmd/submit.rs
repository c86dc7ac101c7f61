use crate::output::{format_body, print_json};
use anyhow::{bail, Context, Result};
use oc2_core::media::COMMAND_MEDIA_TYPE;
use std::io::Read;
use std::path::Path;

pub fn run(file: &Path, server: &str, json: bool) -> Result<()> {
    let body = read_input(file)?;

    // Fail before touching the network when the document is not a command.
    let command = oc2_core::command::decode(&body)
        .with_context(|| format!("{} is not an OpenC2 command", file.display()))?;
    tracing::debug!(action = %command.action, target = ?command.target.target_type(), "submitting");

    let (status, text) = match ureq::post(server)
        .set("Content-Type", COMMAND_MEDIA_TYPE)
        .send_bytes(&body)
    {
        Ok(resp) => (resp.status(), resp.into_string()?),
        Err(ureq::Error::Status(code, resp)) => (code, resp.into_string().unwrap_or_default()),
        Err(e) => return Err(e).with_context(|| format!("cannot reach relay at {server}")),
    };

    if json {
        let body: serde_json::Value =
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text.clone()));
        print_json(&serde_json::json!({ "http_status": status, "body": body }))?;
    } else {
        println!("HTTP {status}");
        if !text.is_empty() {
            println!("{}", format_body(&text, false)?);
        }
    }

    if status >= 400 {
        bail!("relay rejected the command (HTTP {status})");
    }
    Ok(())
}

fn read_input(file: &Path) -> Result<Vec<u8>> {
    if file.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))
}
