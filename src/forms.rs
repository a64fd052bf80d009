// forms.rs
use crate::errors::ServerError;
use astra::Request;
use bytes::Bytes;
use futures::executor::block_on;
use std::collections::HashMap;
use std::convert::Infallible;
use std::io::Read;

pub const MAX_FORM_BYTES: u64 = 64 * 1024;
pub const MAX_UPLOAD_BYTES: u64 = 10_000_000;

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields of a posted form plus any uploaded files, keyed by field name.
#[derive(Debug, Default)]
pub struct PostedForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl PostedForm {
    /// Trimmed value of a text field; blank counts as absent.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// An uploaded file, if the browser sent one with a name.
    pub fn file(&self, key: &str) -> Option<&Upload> {
        self.files
            .get(key)
            .filter(|f| !f.file_name.trim().is_empty())
    }
}

/// Reads an url-encoded or multipart body.
pub fn read_form(req: &mut Request) -> Result<PostedForm, ServerError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let boundary = multer::parse_boundary(&content_type)
            .map_err(|e| ServerError::BadRequest(format!("Malformed multipart header: {e}")))?;
        let body = read_body(req, MAX_UPLOAD_BYTES)?;
        block_on(parse_multipart(body, boundary))
    } else {
        let body = read_body(req, MAX_FORM_BYTES)?;
        Ok(PostedForm {
            fields: url::form_urlencoded::parse(&body).into_owned().collect(),
            files: HashMap::new(),
        })
    }
}

fn read_body(req: &mut Request, limit: u64) -> Result<Vec<u8>, ServerError> {
    let mut body = Vec::new();
    req.body_mut()
        .reader()
        .take(limit + 1)
        .read_to_end(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("Unreadable request body: {e}")))?;

    if body.len() as u64 > limit {
        return Err(ServerError::BadRequest(format!(
            "Request body exceeds {limit} bytes"
        )));
    }
    Ok(body)
}

async fn parse_multipart(body: Vec<u8>, boundary: String) -> Result<PostedForm, ServerError> {
    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(Bytes::from(body)) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let malformed = |e: multer::Error| ServerError::BadRequest(format!("Malformed upload: {e}"));

    let mut form = PostedForm::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await.map_err(malformed)?;
                form.files.insert(
                    name,
                    Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    },
                );
            }
            None => {
                let text = field.text().await.map_err(malformed)?;
                form.fields.insert(name, text);
            }
        }
    }
    Ok(form)
}

/// Reduces a client-supplied file name to a bare, safe one: path components
/// dropped, spaces turned into `_`, anything outside `[A-Za-z0-9._-]` removed
/// and leading dots stripped. `None` if nothing usable is left.
pub fn secure_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_file_names_are_sanitized() {
        assert_eq!(secure_file_name("prior.xlsx").as_deref(), Some("prior.xlsx"));
        assert_eq!(
            secure_file_name("C:\\Users\\me\\My Listings.xlsx").as_deref(),
            Some("My_Listings.xlsx")
        );
        assert_eq!(secure_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(secure_file_name("..").as_deref(), None);
        assert_eq!(secure_file_name("").as_deref(), None);
    }

    #[test]
    fn multipart_fields_and_files_are_split() {
        let body = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"url\"\r\n\r\n\
            https://example.sg/search\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"prior.xlsx\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            PK-bytes\r\n\
            --XYZ--\r\n";

        let form = block_on(parse_multipart(body.as_bytes().to_vec(), "XYZ".to_string())).unwrap();
        assert_eq!(form.value("url"), Some("https://example.sg/search"));
        let file = form.file("file").unwrap();
        assert_eq!(file.file_name, "prior.xlsx");
        assert_eq!(file.bytes, b"PK-bytes");
    }

    #[test]
    fn empty_file_part_counts_as_absent() {
        let body = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"\"\r\n\r\n\
            \r\n\
            --XYZ--\r\n";

        let form = block_on(parse_multipart(body.as_bytes().to_vec(), "XYZ".to_string())).unwrap();
        assert!(form.file("file").is_none());
    }
}
