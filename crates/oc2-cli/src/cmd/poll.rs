use crate::output::format_body;
use anyhow::{bail, Context, Result};
use oc2_core::media::{ASSET_ID_HEADER, COMMAND_MEDIA_TYPE};
use std::time::Duration;

const USER_AGENT: &str = concat!("oc2/", env!("CARGO_PKG_VERSION"));

/// What one GET against the relay produced.
#[derive(Debug)]
enum Outcome {
    Command(String),
    Empty,
}

/// What the loop does after a poll.
#[derive(Debug, PartialEq, Eq)]
enum Next {
    PollAgain,
    Sleep,
    Stop,
}

/// Drain pending commands back to back; wait after an empty or failed poll.
fn next_step(result: &Result<Outcome>, once: bool) -> Next {
    match result {
        _ if once => Next::Stop,
        Ok(Outcome::Command(_)) => Next::PollAgain,
        Ok(Outcome::Empty) | Err(_) => Next::Sleep,
    }
}

pub fn run(
    server: &str,
    mut asset_id: Option<String>,
    interval: u64,
    once: bool,
    json: bool,
) -> Result<()> {
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build();

    loop {
        let result = poll_once(&agent, server, &mut asset_id);
        let next = next_step(&result, once);

        match result {
            Ok(Outcome::Command(body)) => println!("{}", format_body(&body, json)?),
            Ok(Outcome::Empty) => {}
            Err(e) if once => return Err(e),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), retry_in = interval, "error getting data from relay");
            }
        }

        match next {
            Next::PollAgain => {}
            Next::Sleep => std::thread::sleep(Duration::from_secs(interval)),
            Next::Stop => return Ok(()),
        }
    }
}

fn request(agent: &ureq::Agent, server: &str, asset_id: Option<&str>) -> ureq::Request {
    let mut request = agent.get(server).set("Accept", COMMAND_MEDIA_TYPE);
    if let Some(id) = asset_id {
        request = request.set(ASSET_ID_HEADER, id);
    }
    request
}

fn poll_once(agent: &ureq::Agent, server: &str, asset_id: &mut Option<String>) -> Result<Outcome> {
    let resp = match request(agent, server, asset_id.as_deref()).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, resp)) => {
            let text = resp.into_string().unwrap_or_default();
            bail!("relay answered HTTP {code}: {text}");
        }
        Err(e) => return Err(e).with_context(|| format!("cannot reach relay at {server}")),
    };

    if let Some(issued) = resp.header(ASSET_ID_HEADER) {
        if asset_id.as_deref() != Some(issued) {
            tracing::info!(asset_id = issued, "relay issued asset id");
            *asset_id = Some(issued.to_string());
        }
    }

    if resp.status() == 204 {
        return Ok(Outcome::Empty);
    }
    let body = resp.into_string()?;
    Ok(Outcome::Command(body))
}
