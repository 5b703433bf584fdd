/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Remote SPARQL endpoint client. Short queries travel as GET with a
//! percent-encoded query string; once the encoded request exceeds 2 KiB the
//! client falls back to a form-encoded POST. Updates always POST. Non-2xx
//! responses surface as a typed error carrying the status code; the raw
//! response body is returned untouched.

use crate::error::ClientError;
use log::debug;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::io::{Read, Write};
use std::net::TcpStream;
use url::Url;

/// Encoded-request size above which GET gives way to POST.
pub const GET_THRESHOLD: usize = 2048;

#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    url: Url,
}

impl RemoteEndpoint {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let url = Url::parse(endpoint)
            .map_err(|_| ClientError::InvalidEndpoint(endpoint.to_string()))?;
        if url.host_str().is_none() {
            return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(RemoteEndpoint { url })
    }

    pub fn query(&self, sparql: &str) -> Result<String, ClientError> {
        let encoded = utf8_percent_encode(sparql, NON_ALPHANUMERIC).to_string();
        let target = format!("{}?query={}", self.url.path(), encoded);
        if target.len() <= GET_THRESHOLD {
            debug!("remote query via GET ({} bytes)", target.len());
            self.send(&get_request(&self.host_header(), &target))
        } else {
            debug!("remote query via POST ({} encoded bytes)", encoded.len());
            let body = format!("query={}", encoded);
            self.send(&post_request(&self.host_header(), self.url.path(), &body))
        }
    }

    /// Updates mutate the remote store; they always POST.
    pub fn update(&self, sparql: &str) -> Result<String, ClientError> {
        let encoded = utf8_percent_encode(sparql, NON_ALPHANUMERIC).to_string();
        let body = format!("update={}", encoded);
        self.send(&post_request(&self.host_header(), self.url.path(), &body))
    }

    fn host_header(&self) -> String {
        let host = self.url.host_str().unwrap_or("localhost");
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    fn address(&self) -> (String, u16) {
        let host = self.url.host_str().unwrap_or("localhost").to_string();
        let port = self.url.port_or_known_default().unwrap_or(80);
        (host, port)
    }

    fn send(&self, request: &str) -> Result<String, ClientError> {
        let (host, port) = self.address();
        let mut stream = TcpStream::connect((host.as_str(), port))?;
        stream.write_all(request.as_bytes())?;
        stream.flush()?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw)?;

        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut response = httparse::Response::new(&mut headers);
        let header_len = match response.parse(&raw)? {
            httparse::Status::Complete(len) => len,
            httparse::Status::Partial => {
                return Err(ClientError::MalformedResponse(
                    "truncated response header".to_string(),
                ))
            }
        };
        let code = response
            .code
            .ok_or_else(|| ClientError::MalformedResponse("missing status code".to_string()))?;
        let body = String::from_utf8_lossy(&raw[header_len..]).to_string();

        if (200..300).contains(&code) {
            Ok(body)
        } else {
            Err(ClientError::Status { code, body })
        }
    }
}

fn get_request(host: &str, target: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        target, host
    )
}

fn post_request(host: &str, path: &str, body: &str) -> String {
    format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nAccept: */*\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        path,
        host,
        body.len(),
        body
    )
}
