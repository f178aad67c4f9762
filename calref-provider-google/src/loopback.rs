//! One-shot HTTP listener that receives the OAuth redirect.

use std::time::Duration;

use calref_core::{CalRefError, CalRefResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SUCCESS_PAGE: &str = "HTTP/1.1 200 OK\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    Connection: close\r\n\
    \r\n\
    <html><body>\
    <h1>Authorization complete</h1>\
    <p>You can close this window and return to the terminal.</p>\
    </body></html>";

const FAILURE_PAGE: &str = "HTTP/1.1 400 Bad Request\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    Connection: close\r\n\
    \r\n\
    <html><body>\
    <h1>Authorization failed</h1>\
    <p>Return to the terminal for details.</p>\
    </body></html>";

/// Query parameters of the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub code: String,
    pub state: String,
}

/// Listener on an ephemeral loopback port.
pub struct LoopbackListener {
    listener: TcpListener,
    port: u16,
}

impl LoopbackListener {
    pub async fn bind() -> CalRefResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| CalRefError::Auth(format!("failed to bind loopback listener: {e}")))?;
        let port = listener.local_addr()?.port();

        debug!(port, "Listening for OAuth redirect");
        Ok(LoopbackListener { listener, port })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Wait for the redirect and extract the authorization code.
    ///
    /// Accepting, reading the request and replying all share one deadline
    /// and are abandoned when `cancel` fires. Connections closed before
    /// sending a request line are skipped. Consumes the listener, so the
    /// port is released on every return path.
    pub async fn wait_for_code(
        self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> CalRefResult<Callback> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CalRefError::Cancelled),
            result = tokio::time::timeout(timeout, self.accept_callback()) => result.map_err(|_| {
                CalRefError::Auth(format!(
                    "no authorization received within {}s",
                    timeout.as_secs()
                ))
            })?,
        }
    }

    async fn accept_callback(&self) -> CalRefResult<Callback> {
        loop {
            let (stream, _) = self
                .listener
                .accept()
                .await
                .map_err(|e| CalRefError::Auth(format!("failed to accept redirect: {e}")))?;

            match handle_redirect(stream).await? {
                Some(callback) => return Ok(callback),
                None => debug!("Connection closed without a request"),
            }
        }
    }
}

/// Read one request and answer it. `None` if the peer sent nothing.
async fn handle_redirect(stream: TcpStream) -> CalRefResult<Option<Callback>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(None);
    }

    // Drain headers so closing the socket does not reset the connection.
    let mut header = String::new();
    while reader.read_line(&mut header).await? > 0 && !header.trim_end().is_empty() {
        header.clear();
    }

    let result = parse_request_line(&request_line);

    let page = if result.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
    let mut stream = reader.into_inner();
    stream.write_all(page.as_bytes()).await?;
    stream.flush().await?;

    result.map(Some)
}

/// Parse `GET /?code=...&state=... HTTP/1.1`.
fn parse_request_line(request_line: &str) -> CalRefResult<Callback> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| CalRefError::Auth("malformed redirect request".into()))?;

    let url = url::Url::parse(&format!("http://127.0.0.1{target}"))
        .map_err(|e| CalRefError::Auth(format!("malformed redirect target: {e}")))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(CalRefError::Auth(error));
    }

    let code = param("code").unwrap_or_default();
    if code.is_empty() {
        return Err(CalRefError::Auth("no code received".into()));
    }

    Ok(Callback {
        code,
        state: param("state").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn send(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(format!("GET {target} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n").as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_parse_request_line() {
        let callback = parse_request_line("GET /?state=xyz&code=4%2F0Abc HTTP/1.1\r\n").unwrap();
        assert_eq!(callback.code, "4/0Abc");
        assert_eq!(callback.state, "xyz");
    }

    #[test]
    fn test_error_param_is_reported() {
        let err = parse_request_line("GET /?error=access_denied HTTP/1.1").unwrap_err();
        assert!(matches!(err, CalRefError::Auth(ref m) if m == "access_denied"));
    }

    #[test]
    fn test_empty_code() {
        let err = parse_request_line("GET /?code=&state=s HTTP/1.1").unwrap_err();
        assert!(matches!(err, CalRefError::Auth(ref m) if m == "no code received"));
    }

    #[tokio::test]
    async fn test_receives_code_over_tcp() {
        let listener = LoopbackListener::bind().await.unwrap();
        let port = listener.port;
        assert_eq!(listener.redirect_uri(), format!("http://127.0.0.1:{port}"));

        let cancel = CancellationToken::new();
        let wait = tokio::spawn(async move {
            listener.wait_for_code(Duration::from_secs(5), &cancel).await
        });

        let response = send(port, "/?code=abc&state=s1&scope=x").await;
        let callback = wait.await.unwrap().unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(callback, Callback { code: "abc".into(), state: "s1".into() });
    }

    #[tokio::test]
    async fn test_denied_consent_gets_failure_page() {
        let listener = LoopbackListener::bind().await.unwrap();
        let port = listener.port;

        let cancel = CancellationToken::new();
        let wait = tokio::spawn(async move {
            listener.wait_for_code(Duration::from_secs(5), &cancel).await
        });

        let response = send(port, "/?error=access_denied").await;

        assert!(response.starts_with("HTTP/1.1 400"));
        assert!(matches!(wait.await.unwrap(), Err(CalRefError::Auth(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let listener = LoopbackListener::bind().await.unwrap();
        let err = listener
            .wait_for_code(Duration::from_millis(20), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CalRefError::Auth(_)));
    }

    #[tokio::test]
    async fn test_silent_connection_times_out() {
        let listener = LoopbackListener::bind().await.unwrap();
        let port = listener.port;

        let wait = tokio::spawn(async move {
            listener
                .wait_for_code(Duration::from_millis(200), &CancellationToken::new())
                .await
        });

        let _silent = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(3), wait)
            .await
            .expect("wait_for_code should give up")
            .unwrap();
        assert!(matches!(result, Err(CalRefError::Auth(_))));
    }

    #[tokio::test]
    async fn test_silent_connection_is_cancellable() {
        let listener = LoopbackListener::bind().await.unwrap();
        let port = listener.port;
        let cancel = CancellationToken::new();
        let waiter_cancel = cancel.clone();

        let wait = tokio::spawn(async move {
            listener
                .wait_for_code(Duration::from_secs(60), &waiter_cancel)
                .await
        });

        let _silent = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(3), wait)
            .await
            .expect("wait_for_code should stop on cancel")
            .unwrap();
        assert!(matches!(result, Err(CalRefError::Cancelled)));
    }

    #[tokio::test]
    async fn test_closed_preconnect_is_skipped() {
        let listener = LoopbackListener::bind().await.unwrap();
        let port = listener.port;

        let cancel = CancellationToken::new();
        let wait = tokio::spawn(async move {
            listener.wait_for_code(Duration::from_secs(5), &cancel).await
        });

        drop(TcpStream::connect(("127.0.0.1", port)).await.unwrap());
        send(port, "/?code=xyz&state=s2").await;

        let callback = wait.await.unwrap().unwrap();
        assert_eq!(callback.code, "xyz");
    }

    #[tokio::test]
    async fn test_cancel_releases_port() {
        let listener = LoopbackListener::bind().await.unwrap();
        let port = listener.port;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = listener
            .wait_for_code(Duration::from_secs(5), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, CalRefError::Cancelled));
        assert!(TcpListener::bind(("127.0.0.1", port)).await.is_ok());
    }
}
