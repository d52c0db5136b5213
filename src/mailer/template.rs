//! Email template rendering.
//!
//! Every notification is a paired (plain text, HTML) rendering of the same
//! title/message/manifest-summary structure.

use crate::db::FileEntry;
use crate::sizefmt::format_size;

/// Build the line-per-file manifest summary shared by all templates.
pub fn files_summary(manifest: &[FileEntry]) -> String {
    let mut summary = String::new();
    for entry in manifest {
        summary.push_str(&format!("- {} ({})\n", entry.name, format_size(entry.size)));
    }
    summary
}

/// Formatted total size of a manifest.
pub fn total_size(manifest: &[FileEntry]) -> String {
    format_size(manifest.iter().map(|f| f.size).sum())
}

/// Render the paired plain-text and HTML bodies of a notification.
pub fn render(
    title: &str,
    message: &str,
    summary: &str,
    total: &str,
    download_link: Option<&str>,
) -> (String, String) {
    let text_link = download_link
        .map(|link| format!("Download link: {link}\n\n"))
        .unwrap_or_default();

    let text = format!(
        "{title}\n\n{message}\n\n{text_link}Files:\n{summary}\nTotal size: {total}\n\nSent via iTransfer\n"
    );

    let html_link = download_link
        .map(|link| {
            format!(r#"<p><a href="{link}" style="display:inline-block;padding:12px 24px;background-color:#693a67;color:#ffffff;text-decoration:none;border-radius:6px;">Download files</a></p>"#)
        })
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family:sans-serif;color:#170017;background-color:#f5f5f5;margin:0;padding:20px;">
  <div style="max-width:600px;margin:0 auto;background-color:#ffffff;border-radius:12px;">
    <div style="text-align:center;padding:30px 0;background:#693a67;border-radius:12px 12px 0 0;">
      <h1 style="color:#ffffff;margin:0;">iTransfer</h1>
    </div>
    <div style="padding:30px;">
      <h2 style="color:#693a67;">{title}</h2>
      <p>{message}</p>
      {html_link}
      <pre style="background-color:#f8f9fa;padding:20px;border-radius:8px;font-family:sans-serif;">{summary}</pre>
      <div style="padding:15px 20px;background-color:#693a67;color:#ffffff;border-radius:8px;">{total}</div>
    </div>
    <div style="text-align:center;padding:20px;color:#5a4e5a;font-size:14px;">
      <p>Sent via iTransfer</p>
    </div>
  </div>
</body>
</html>
"#
    );

    (text, html)
}
