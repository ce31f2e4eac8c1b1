//! Presentation boundary
//!
//! Session components describe *what* happened as a [`Page`]; a
//! [`Presenter`] decides how that looks on the wire. The core only ever
//! calls [`Presenter::respond`] and [`Presenter::not_found`], so the page
//! layout and response framing can be swapped without touching the
//! coordinator or session code.

use bytes::Bytes;

use crate::request::UPDATE_MARKER;
use crate::token::{port_token, state_token};

/// Session event to be rendered for the client.
///
/// `port` is always the port the client should submit to next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page<'a> {
    /// A session listener has bound and is ready for requests
    Announce {
        port: u16,
        host: &'a str,
        request: &'a str,
    },
    /// Counter was incremented
    Conversation {
        port: u16,
        host: &'a str,
        request: &'a str,
        counter: u64,
    },
    /// Session moved; `port` is the new session port on `host`
    Migrated {
        port: u16,
        host: &'a str,
        request: &'a str,
    },
    /// Request was not understood or could not be carried out
    Invalid {
        port: u16,
        host: &'a str,
        request: &'a str,
        reason: &'a str,
    },
}

/// Turns pages into response bytes
pub trait Presenter: Send + Sync {
    /// Render a page body
    fn render(&self, page: &Page<'_>) -> String;

    /// Frame a rendered body as a complete response
    fn wrap(&self, body: &str) -> Bytes;

    /// Response for traffic that is not a session request
    fn not_found(&self) -> Bytes;

    /// Render and frame in one step
    fn respond(&self, page: &Page<'_>) -> Bytes {
        self.wrap(&self.render(page))
    }
}

/// Browser-facing presenter: an HTML form wrapped in an HTTP/1.1 response
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPresenter;

impl HtmlPresenter {
    pub fn new() -> Self {
        Self
    }

    fn header(port: u16, host: &str, request: &str) -> String {
        let mut html = String::new();
        html.push_str("<html><head> </head><body>\n");
        html.push_str(&format!(
            "<h2>This is for submission to PORT {} on {}</h2>\n",
            port, host
        ));
        html.push_str(&format!("<h3>You sent: {}</h3>", escape(request)));
        html.push_str(&format!(
            "\n<form method=\"GET\" action=\"http://{}:{}\">\n",
            host, port
        ));
        html.push_str("Enter text or <i>migrate</i>:");
        html.push_str(&format!(
            "\n<input type=\"text\" name=\"{}\" size=\"20\" value=\"YourTextInput\" /> <p>\n",
            UPDATE_MARKER
        ));
        html
    }

    fn footer() -> &'static str {
        "<input type=\"submit\" value=\"Submit\" /></p>\n</form></body></html>\n"
    }
}

impl Presenter for HtmlPresenter {
    fn render(&self, page: &Page<'_>) -> String {
        let (port, host, request) = match *page {
            Page::Announce { port, host, request }
            | Page::Conversation { port, host, request, .. }
            | Page::Migrated { port, host, request }
            | Page::Invalid { port, host, request, .. } => (port, host, request),
        };

        let mut html = Self::header(port, host, request);
        match *page {
            Page::Announce { port, .. } => {
                html.push_str("Session listener ready\n<br />\n");
                html.push_str(&format!("{}<br/>\n", port_token(port)));
            }
            Page::Conversation { counter, .. } => {
                html.push_str(&format!(
                    "<h3>We are having a conversation with state {}</h3>\n",
                    counter
                ));
                html.push_str(&format!("{}<br/>\n", state_token(counter)));
            }
            Page::Migrated { port, .. } => {
                html.push_str(&format!("<h3>We are migrating to host {}</h3>\n", port));
                html.push_str(&format!("{}<br/>\n", port_token(port)));
                html.push_str(
                    "<h3>View the source of this page to see how the client is informed of the new location.</h3>\n",
                );
            }
            Page::Invalid { reason, .. } => {
                html.push_str("You have not entered a valid request!\n");
                if !reason.is_empty() {
                    html.push_str(&format!("<p>{}</p>\n", escape(reason)));
                }
            }
        }
        html.push_str(Self::footer());
        html
    }

    fn wrap(&self, body: &str) -> Bytes {
        Bytes::from(format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: text/html\r\n\r\n{}",
            body.len(),
            body
        ))
    }

    fn not_found(&self) -> Bytes {
        Bytes::from_static(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
    }
}

/// Minimal HTML escaping for echoed client text
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
