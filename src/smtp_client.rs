/*
Mail submission client.

Sends one pre-composed message to a submission server (port 587 by default):

    220 greeting
    EHLO
    STARTTLS            required, the session never continues in plaintext
    EHLO                again, over TLS
    AUTH XOAUTH2        bearer token, no password mechanisms are offered
    MAIL FROM / RCPT TO exactly one recipient
    DATA                dot-stuffing and the final "." are done by lettre
    QUIT

lettre opens the TCP connection itself and never reads proxy settings from
the environment, so the connection always goes direct. One attempt only: any
error is returned to the caller unchanged.
*/

use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use log::{debug, info};

use crate::entities::{MailEnvelope, OAuthCredentials, ServerTarget};
use crate::error::SenderError;
use crate::message::ComposedMessage;

#[derive(Debug)]
pub struct SubmissionClient {
    target: ServerTarget,
    credentials: OAuthCredentials,
}

impl SubmissionClient {
    pub fn new(target: ServerTarget, credentials: OAuthCredentials) -> Self {
        SubmissionClient {
            target,
            credentials,
        }
    }

    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    // starttls_relay pins Tls::Required; rustls offers TLS 1.2 and 1.3 only.
    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, SenderError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.target.host)?
            .port(self.target.port)
            .credentials(Credentials::from(&self.credentials))
            .authentication(vec![Mechanism::Xoauth2])
            .build();
        Ok(transport)
    }

    pub async fn submit(
        &self,
        envelope: &MailEnvelope,
        message: &ComposedMessage,
    ) -> Result<(), SenderError> {
        let transport = self.transport()?;
        let lettre_envelope = envelope.to_lettre()?;

        info!(
            "Submitting {} bytes to {} as {}",
            message.len(),
            self.target,
            self.credentials.username
        );
        debug!("Envelope: MAIL FROM:<{}> RCPT TO:<{}>", envelope.from, envelope.to);

        let response = transport
            .send_raw(&lettre_envelope, message.as_bytes())
            .await?;

        debug!(
            "Server reply: {} {}",
            response.code(),
            response.message().collect::<Vec<_>>().join(" ")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportFailure;
    use chrono::Utc;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    // Speaks just enough SMTP to get past EHLO, and advertises AUTH but not STARTTLS.
    async fn plaintext_only_server() -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut seen = Vec::new();

            write.write_all(b"220 mock.local ESMTP\r\n").await.unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                let reply: &[u8] = if line.starts_with("EHLO") {
                    b"250-mock.local\r\n250 AUTH XOAUTH2 PLAIN\r\n"
                } else if line.starts_with("QUIT") {
                    b"221 bye\r\n"
                } else {
                    b"502 unsupported\r\n"
                };
                seen.push(line);
                if write.write_all(reply).await.is_err() {
                    break;
                }
            }
            seen
        });

        (port, handle)
    }

    fn client(port: u16) -> SubmissionClient {
        SubmissionClient::new(
            ServerTarget::new("127.0.0.1", port),
            OAuthCredentials::new("a@x.com", "token-value").unwrap(),
        )
    }

    #[test]
    fn test_transport_builds_without_connecting() {
        let client = SubmissionClient::new(
            ServerTarget::default(),
            OAuthCredentials::new("you@contoso.com", "token-value").unwrap(),
        );
        assert!(client.transport().is_ok());
        assert_eq!(client.target().port, 587);
    }

    #[tokio::test]
    async fn test_refuses_to_authenticate_without_starttls() {
        let (port, server) = plaintext_only_server().await;
        let envelope = MailEnvelope::new("a@x.com", "b@y.com").unwrap();
        let message =
            crate::message::compose("a@x.com", "b@y.com", "Test", b"<p>Hi</p>", Utc::now()).unwrap();

        let err = client(port).submit(&envelope, &message).await.unwrap_err();
        assert!(matches!(err, SenderError::Transport(_)));
        if let SenderError::Transport(ref inner) = err {
            assert_eq!(TransportFailure::classify(inner), TransportFailure::Client);
        }
        assert_eq!(err.exit_code(), 64);

        let seen = server.await.unwrap();
        assert!(seen.first().is_some_and(|line| line.starts_with("EHLO")));
        for line in &seen {
            assert!(!line.starts_with("AUTH"), "credentials sent in plaintext: {}", line);
            assert!(!line.starts_with("MAIL"), "envelope sent in plaintext: {}", line);
            assert!(!line.starts_with("DATA"), "data sent in plaintext: {}", line);
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_single_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let envelope = MailEnvelope::new("a@x.com", "b@y.com").unwrap();
        let message =
            crate::message::compose("a@x.com", "b@y.com", "Test", b"<p>Hi</p>", Utc::now()).unwrap();

        let err = client(port).submit(&envelope, &message).await.unwrap_err();
        assert!(matches!(err, SenderError::Transport(_)));
        assert_ne!(err.exit_code(), 0);
        assert_ne!(err.exit_code(), 1);
    }
}
