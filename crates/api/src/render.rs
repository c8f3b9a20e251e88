//! HTML rendering of a catalog.

use std::fmt::Write as _;

use galleria_core::catalog::{Catalog, MediaItem, MediaKind, UploadDate};

/// Render the gallery page of a catalog.
#[must_use]
pub fn render_gallery(catalog: &Catalog) -> String {
    let title = if catalog.folder.is_empty() {
        "Gallery".to_string()
    } else {
        format!("Gallery - {}", escape(&catalog.folder))
    };

    let mut html = String::with_capacity(4096 + catalog.items.len() * 256);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );

    render_navigation(&mut html, catalog);
    render_forms(&mut html, &catalog.folder);

    html.push_str("<main class=\"grid\">\n");
    if catalog.items.is_empty() {
        html.push_str("<p class=\"empty\">No media in this folder.</p>\n");
    }
    for item in &catalog.items {
        render_item(&mut html, item);
    }
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_navigation(html: &mut String, catalog: &Catalog) {
    html.push_str("<nav>\n");
    if !catalog.folder.is_empty() {
        let parent = catalog
            .folder
            .rsplit_once('/')
            .map_or("", |(parent, _)| parent);
        let _ = writeln!(html, "<a class=\"up\" href=\"{}\">..</a>", folder_href(parent));
    }
    for name in &catalog.folders {
        let target = if catalog.folder.is_empty() {
            name.clone()
        } else {
            format!("{}/{name}", catalog.folder)
        };
        let _ = writeln!(
            html,
            "<a class=\"folder\" href=\"{}\">{}</a>",
            folder_href(&target),
            escape(name)
        );
    }
    html.push_str("</nav>\n");
}

fn render_forms(html: &mut String, folder: &str) {
    let folder = escape(folder);
    let _ = write!(
        html,
        "<section class=\"forms\">\n\
         <form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" required>\n\
         <input type=\"hidden\" name=\"folder\" value=\"{folder}\">\n\
         <input type=\"text\" name=\"storage\" placeholder=\"all\">\n\
         <button type=\"submit\">Upload</button>\n</form>\n\
         <form method=\"post\" action=\"/create-folder\">\n\
         <input type=\"text\" name=\"folderName\" placeholder=\"New folder\" required>\n\
         <button type=\"submit\">Create folder</button>\n</form>\n\
         <form method=\"post\" action=\"/delete-folder\">\n\
         <input type=\"text\" name=\"folderName\" placeholder=\"Folder to delete\" required>\n\
         <button type=\"submit\">Delete folder</button>\n</form>\n\
         </section>\n"
    );
}

fn render_item(html: &mut String, item: &MediaItem) {
    let url = escape(&item.url);
    let name = escape(item.file_name());
    html.push_str("<figure>\n");
    match item.kind {
        MediaKind::Image => {
            let _ = writeln!(html, "<img src=\"{url}\" alt=\"{name}\" loading=\"lazy\">");
        }
        MediaKind::Video => {
            let _ = writeln!(html, "<video src=\"{url}\" controls preload=\"metadata\"></video>");
        }
    }
    let date = match item.upload_date {
        UploadDate::Known(date) => date.format("%Y-%m-%d %H:%M").to_string(),
        UploadDate::Unknown => "unknown".to_string(),
    };
    let _ = writeln!(
        html,
        "<figcaption><a href=\"{url}\">{name}</a> <span>{} | {} | {date}</span></figcaption>",
        escape(&item.backend),
        human_size(item.size)
    );
    html.push_str("</figure>\n");
}

fn folder_href(folder: &str) -> String {
    if folder.is_empty() {
        "/gallery".to_string()
    } else {
        format!("/gallery?folder={}", urlencoding::encode(folder))
    }
}

/// Escape text for HTML content and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

const STYLE: &str = "body{font-family:sans-serif;margin:1rem;background:#111;color:#eee}\
a{color:#8cf}nav a{margin-right:.75rem}\
.forms{display:flex;gap:1rem;flex-wrap:wrap;margin:1rem 0}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:1rem}\
figure{margin:0;background:#222;padding:.5rem;border-radius:4px}\
img,video{width:100%;height:auto;display:block}\
figcaption{font-size:.8rem;margin-top:.25rem;word-break:break-all}";
