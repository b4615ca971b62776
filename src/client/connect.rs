use crate::protocol::QoS;

/// A will message to be published by the server if the connection is lost uncleanly.
#[derive(Debug, Clone, Copy)]
pub struct Will<'a> {
    pub topic: &'a str,
    pub message: &'a str,
    pub qos: QoS,
    pub retain: bool,
}

/// Parameters for a [`Client::connect`](crate::client::Client::connect) call, built by chaining
/// setter methods onto [`ConnectInfo::new`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectInfo<'a> {
    pub(super) client_id: &'a str,
    pub(super) keep_alive: u16,
    pub(super) clean_session: bool,
    pub(super) username: Option<&'a str>,
    pub(super) password: Option<&'a str>,
    pub(super) will: Option<Will<'a>>,
}

impl<'a> ConnectInfo<'a> {
    /// Starts building connection info for `client_id`.
    ///
    /// Defaults to `clean_session = true` and no keep-alive, will, or credentials.
    pub fn new(client_id: &'a str) -> Self {
        Self {
            client_id,
            keep_alive: 0,
            clean_session: true,
            username: None,
            password: None,
            will: None,
        }
    }

    pub fn keep_alive(mut self, seconds: u16) -> Self {
        self.keep_alive = seconds;
        self
    }

    pub fn clean_session(mut self, clean_session: bool) -> Self {
        self.clean_session = clean_session;
        self
    }

    pub fn with_credentials(mut self, username: &'a str, password: &'a str) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    pub fn with_will(mut self, will: Will<'a>) -> Self {
        self.will = Some(will);
        self
    }
}
