//! Minimal HTML pages. Everything interpolated goes through `html_escape`.

use crate::models::file::{FileList, FileResponse};

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body>\n<nav><a href=\"/\">Home</a> | <a href=\"/upload\">Upload</a> | \
         <a href=\"/list\">Files</a></nav>\n{}\n</body>\n</html>\n",
        html_escape(title),
        body
    )
}

pub fn home() -> String {
    layout(
        "File Web",
        "<h1>File Web</h1>\n<p>Upload a file and share its ID to let others download it.</p>\n\
         <ul><li><a href=\"/upload\">Upload a file</a></li>\
         <li><a href=\"/list\">Browse files</a></li></ul>",
    )
}

pub fn upload_form() -> String {
    layout(
        "Upload",
        "<h1>Upload</h1>\n\
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" required> \
         <button type=\"submit\">Upload</button></form>",
    )
}

pub fn upload_complete(response: &FileResponse) -> String {
    let id = html_escape(&response.id);
    let body = format!(
        "<h1>Upload complete</h1>\n<dl><dt>ID</dt><dd><code>{id}</code></dd>\
         <dt>Access token</dt><dd><code>{}</code></dd></dl>\n\
         <p><a href=\"/download/{id}\">Download</a></p>",
        html_escape(&response.access_token),
    );
    layout("Upload complete", &body)
}

pub fn file_list(list: &FileList) -> String {
    let mut body = String::from("<h1>Files</h1>\n");
    if list.files.is_empty() {
        body.push_str("<p>No files yet.</p>");
        return layout("Files", &body);
    }

    body.push_str("<table>\n<tr><th>ID</th><th>Name</th><th>Size</th></tr>\n");
    for file in &list.files {
        let id = html_escape(&file.id);
        body.push_str(&format!(
            "<tr><td><a href=\"/download/{id}\">{id}</a></td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&file.name),
            file.size
        ));
    }
    body.push_str("</table>");
    layout("Files", &body)
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::file::File;

    #[test]
    fn names_are_escaped() {
        let page = file_list(&FileList {
            files: vec![File {
                id: "6d468b76-cf62-4b90-a238-bc0c4ace1648".into(),
                name: "<script>alert('x')</script>".into(),
                size: 12,
                content_type: None,
            }],
        });
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(page.contains("/download/6d468b76-cf62-4b90-a238-bc0c4ace1648"));
    }

    #[test]
    fn empty_listing_says_so() {
        assert!(file_list(&FileList::default()).contains("No files yet."));
    }

    #[test]
    fn completion_page_shows_id_and_token() {
        let page = upload_complete(&FileResponse {
            id: "abc".into(),
            access_token: "tok".into(),
        });
        assert!(page.contains("<code>abc</code>"));
        assert!(page.contains("<code>tok</code>"));
    }
}
