// src/exec/http.rs

//! `httpGet` backend: one GET per run, raw response written to stdout.

use std::io::{self, Write};

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Version};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::HttpGetSpec;
use crate::errors::ActionError;

#[derive(Debug)]
pub struct HttpGetBackend {
    url: String,
    client: reqwest::Client,
}

impl HttpGetBackend {
    pub fn new(spec: &HttpGetSpec) -> Self {
        Self {
            url: with_default_scheme(&spec.url),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ActionError> {
        let request = async {
            let response = self.client.get(&self.url).send().await?;
            let version = response.version();
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((version, status, headers, body))
        };

        let (version, status, headers, body) = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(url = %self.url, "session cancelled; request aborted");
                return Ok(());
            }
            result = request => result.map_err(|source| ActionError::Http {
                url: self.url.clone(),
                source,
            })?,
        };

        info!(url = %self.url, %status, "GET completed");
        let mut stdout = io::stdout().lock();
        write_response(&mut stdout, version, status, &headers, &body)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Prefix `http://` when the URL carries no scheme.
pub fn with_default_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Status line, headers, blank line, body.
pub fn write_response<W: Write>(
    out: &mut W,
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> io::Result<()> {
    write!(out, "{version:?} {status}\r\n")?;
    for (name, value) in headers {
        write!(out, "{name}: ")?;
        out.write_all(value.as_bytes())?;
        out.write_all(b"\r\n")?;
    }
    out.write_all(b"\r\n")?;
    out.write_all(body)
}
