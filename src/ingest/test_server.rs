/// Local HTTP server for exercising the clients against real responses:
/// error statuses, slow handlers and partially failing forecasts.
///
/// Each test starts its own server on an ephemeral port; the accept loop
/// lives until the test process exits.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A canned response for one request path (query string ignored).
pub(crate) struct Route {
    pub path: String,
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

pub(crate) fn route(path: &str, status: u16, body: &str) -> Route {
    Route {
        path: path.to_string(),
        status,
        body: body.to_string(),
        delay: Duration::ZERO,
    }
}

impl Route {
    /// Holds the response back for `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Starts serving `routes` and returns the base URL. Unknown paths get 404.
pub(crate) fn serve(routes: Vec<Route>) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("test server should bind");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("test server listens on TCP");
    let routes = Arc::new(routes);

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || {
                let path = request.url().split('?').next().unwrap_or_default().to_string();
                let (status, body, delay) = match routes.iter().find(|r| r.path == path) {
                    Some(r) => (r.status, r.body.clone(), r.delay),
                    None => (404, String::new(), Duration::ZERO),
                };

                thread::sleep(delay);
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(tiny_http::StatusCode::from(status));
                // the client may have given up already
                let _ = request.respond(response);
            });
        }
    });

    format!("http://{}", addr)
}
