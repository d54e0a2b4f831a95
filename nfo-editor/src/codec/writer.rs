//! Record serialization
//!
//! Known fields are written in a fixed order with two-space indentation.
//! Preserved fragments are appended verbatim after the known fields.

use tracing::warn;

use super::check_fragment;
use crate::models::{Actor, Record};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const INDENT: &str = "  ";

/// Escape text content for XML
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn write_record(record: &Record) -> String {
    let root = record.kind.root_tag();
    let mut out = String::with_capacity(512);
    out.push_str(DECLARATION);
    out.push('\n');
    out.push_str(&format!("<{}>\n", root));

    text_element(&mut out, 1, "title", &record.title);
    text_element(&mut out, 1, "originaltitle", &record.original_title);
    text_element(&mut out, 1, "year", &record.year);
    text_element(&mut out, 1, "plot", &record.plot);
    text_element(&mut out, 1, "runtime", &record.runtime);
    text_element(&mut out, 1, "studio", &record.studio);
    text_element(&mut out, 1, "rating", &record.rating);

    for genre in &record.genres {
        text_element(&mut out, 1, "genre", genre);
    }
    for director in &record.directors {
        text_element(&mut out, 1, "director", director);
    }
    for actor in &record.cast {
        actor_element(&mut out, actor);
    }

    text_element(&mut out, 1, "poster", &record.poster_path);
    text_element(&mut out, 1, "fanart", &record.fanart_path);

    if record.kind.has_episode_fields() {
        text_element(&mut out, 1, "season", &record.season);
        text_element(&mut out, 1, "episode", &record.episode);
        text_element(&mut out, 1, "aired", &record.aired);
    }

    for (tag, value) in &record.extra {
        for fragment in value.fragments() {
            // Malformed fragments are dropped, losing that element
            if let Err(e) = check_fragment(fragment) {
                warn!(tag = %tag, "Dropping preserved element that is not well-formed: {}", e);
                continue;
            }
            out.push_str(INDENT);
            out.push_str(fragment.trim());
            out.push('\n');
        }
    }

    out.push_str(&format!("</{}>\n", root));
    out
}

fn text_element(out: &mut String, level: usize, tag: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    always_element(out, level, tag, text);
}

fn always_element(out: &mut String, level: usize, tag: &str, text: &str) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
    if text.is_empty() {
        out.push_str(&format!("<{}/>\n", tag));
    } else {
        out.push_str(&format!("<{tag}>{}</{tag}>\n", xml_escape(text)));
    }
}

fn actor_element(out: &mut String, actor: &Actor) {
    out.push_str(INDENT);
    out.push_str("<actor>\n");
    always_element(out, 2, "name", &actor.name);
    text_element(out, 2, "role", &actor.role);
    text_element(out, 2, "thumb", &actor.thumb);
    always_element(out, 2, "order", &actor.order.to_string());
    out.push_str(INDENT);
    out.push_str("</actor>\n");
}
