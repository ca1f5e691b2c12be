//! `{name}` placeholder templates for listing URLs

/// Lists the placeholder names of a template, in order of appearance
pub fn placeholders(template: &str) -> Result<Vec<String>, String> {
    let mut names = Vec::new();
    render_with(template, |name| {
        names.push(name.to_string());
        Some(String::new())
    })?;
    Ok(names)
}

/// Substitutes every `{name}` in the template with `lookup(name)`
///
/// Fails on an unknown placeholder or an unbalanced brace.
pub fn render<F>(template: &str, lookup: F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    render_with(template, lookup)
}

fn render_with<F>(template: &str, mut lookup: F) -> Result<String, String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(format!("unbalanced '}}' in template '{}'", template));
        }

        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| format!("unclosed '{{' in template '{}'", template))?;

        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            return Err(format!("malformed placeholder in template '{}'", template));
        }

        let value = lookup(name)
            .ok_or_else(|| format!("unknown placeholder '{{{}}}' in template", name))?;
        out.push_str(&value);
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
