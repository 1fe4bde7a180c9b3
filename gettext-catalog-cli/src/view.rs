use gettext_catalog::{Catalog, Message, Resource};
use serde_json::{Value, json};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_VALUE_WIDTH: usize = 50;

/// Shortens `value` to at most `max_width` terminal columns, appending `...`
/// when something was cut.
pub fn truncate(value: &str, max_width: usize) -> String {
    if value.width() <= max_width {
        return value.to_string();
    }
    let mut width = 0;
    let mut truncated = String::new();
    for ch in value.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        width += ch_width;
        truncated.push(ch);
    }
    truncated.push_str("...");
    truncated
}

fn sorted_messages(catalog: &Catalog) -> Vec<&Message> {
    let mut messages: Vec<&Message> = catalog.messages().collect();
    messages.sort_by(|a, b| (&a.context, &a.id).cmp(&(&b.context, &b.id)));
    messages
}

/// Print a view of a loaded catalog.
pub fn print_view(resource: &Resource, catalog: &Catalog, full: bool) {
    let shown = |value: &str| {
        if full {
            value.to_string()
        } else {
            truncate(value, MAX_VALUE_WIDTH)
        }
    };

    println!("Language: {}", resource.language().unwrap_or("(unknown)"));
    println!("Plural rule: {}", catalog.plural_rule());
    println!("Plural forms: {}", catalog.plural_rule().nplurals());
    println!("Messages: {}", catalog.len());

    for (i, message) in sorted_messages(catalog).into_iter().enumerate() {
        println!("\n  Message {}: {}", i + 1, message.id);
        if !message.context.is_empty() {
            println!("    Context: {}", message.context);
        }
        if message.is_plural() {
            println!("    Plural ID: {}", message.id_plural);
            for (form, value) in message.plural_translations.iter().enumerate() {
                println!("      [{}]: {}", form, shown(value));
            }
        } else {
            println!("    Value: {}", shown(&message.translation));
        }
        if !message.is_translated() {
            println!("    Status: untranslated");
        }
    }
}

/// Machine-readable view of a loaded catalog.
pub fn view_json(resource: &Resource, catalog: &Catalog) -> Value {
    json!({
        "language": resource.language(),
        "plural_rule": catalog.plural_rule().to_string(),
        "nplurals": catalog.plural_rule().nplurals(),
        "messages": sorted_messages(catalog),
    })
}
