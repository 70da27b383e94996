use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Expand `{{ env.VAR }}` placeholders in raw configuration text
///
/// `{{ env.VAR | default("fallback") }}` substitutes the fallback when the
/// variable is unset. Comment lines are copied through untouched, so a
/// commented-out placeholder never requires its variable.
pub(crate) fn expand_env(input: &str) -> anyhow::Result<String> {
    let re = placeholder()?;

    let lines = input
        .split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with('#') {
                Ok(line.to_owned())
            } else {
                expand_line(re, line)
            }
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(lines.concat())
}

fn placeholder() -> anyhow::Result<&'static Regex> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

    // 1: scoped key, 2: optional default
    RE.get_or_init(|| Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#))
        .as_ref()
        .map_err(|e| anyhow::anyhow!("invalid placeholder pattern: {e}"))
}

fn expand_line(re: &Regex, line: &str) -> anyhow::Result<String> {
    let mut expanded = String::with_capacity(line.len());
    let mut last = 0;

    for captures in re.captures_iter(line) {
        let (start, end) = captures.get(0).map_or((last, last), |m| (m.start(), m.end()));
        expanded.push_str(&line[last..start]);
        expanded.push_str(&resolve(&captures)?);
        last = end;
    }

    expanded.push_str(&line[last..]);
    Ok(expanded)
}

fn resolve(captures: &Captures<'_>) -> anyhow::Result<String> {
    let key = captures.get(1).map_or("", |m| m.as_str());
    let fallback = captures.get(2).map(|m| m.as_str());

    let Some(name) = key.strip_prefix("env.").filter(|name| !name.is_empty() && !name.contains('.')) else {
        anyhow::bail!("only variables scoped with 'env.' are supported: `{key}`");
    };

    match (std::env::var(name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_owned()),
        (Err(_), None) => anyhow::bail!("environment variable not found: `{name}`"),
    }
}
