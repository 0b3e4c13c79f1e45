// HTML rendering of the member list

use roster_core::Member;
use std::fmt::Write;

const COLUMNS: [&str; 8] = [
    "id",
    "name",
    "deleted",
    "real_name",
    "tz",
    "status_text",
    "status_emoji",
    "image_512",
];

/// Render members as a full HTML page, ordered by id
pub fn render_members(members: &[Member]) -> String {
    let mut sorted: Vec<&Member> = members.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Members</title></head>\n<body>\n<table>\n<tr>",
    );
    for column in COLUMNS {
        let _ = write!(html, "<th>{}</th>", column);
    }
    html.push_str("</tr>\n");

    for member in sorted {
        let deleted = if member.deleted { "true" } else { "false" };
        let cells = [
            member.id.as_str(),
            member.name.as_str(),
            deleted,
            member.real_name.as_str(),
            member.timezone.as_str(),
            member.status_text.as_str(),
            member.status_emoji.as_str(),
            member.avatar_url.as_str(),
        ];

        html.push_str("<tr>");
        for cell in cells {
            let _ = write!(html, "<td>{}</td>", escape(cell));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Escape text for use in HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
