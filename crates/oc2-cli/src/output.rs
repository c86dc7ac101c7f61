use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Render a raw body as JSON when it parses, verbatim otherwise. `compact`
/// keeps each document on one line.
pub fn format_body(body: &str, compact: bool) -> anyhow::Result<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(body.to_string());
    };
    let rendered = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    Ok(rendered)
}
