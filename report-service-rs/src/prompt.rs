// report-service-rs/src/prompt.rs
// Builds the single user message sent to the assistant

use crate::submission::FormSubmission;

/// Assemble the prompt text
///
/// Layout: the base instructions, a view header block, then one
/// `Humanized Key: value` line per field in submission order.
pub fn build(
    base_instructions: &str,
    view_name: &str,
    view_display_name: &str,
    values: &FormSubmission,
) -> String {
    let mut prompt = String::from(base_instructions);
    prompt.push_str("\nView Name: ");
    prompt.push_str(view_name);
    prompt.push_str("\nView Display Name: ");
    prompt.push_str(view_display_name);
    prompt.push_str("\n\n");

    for (key, value) in values.iter() {
        prompt.push_str(&humanize_key(key));
        prompt.push_str(": ");
        prompt.push_str(value);
        prompt.push('\n');
    }

    prompt
}

/// `customer_name` -> `Customer Name`
pub fn humanize_key(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Append the rendered view output, if there is any
pub fn with_view_data(mut prompt: String, html: &str) -> String {
    if !html.is_empty() {
        prompt.push_str("\nView Data: ");
        prompt.push_str(html);
        prompt.push('\n');
    }
    prompt
}
