use crate::control::dispatcher::PenaltyCommand;
use crate::prelude::{ClientError, ClientResult};
use crate::protocol::StatusSnapshot;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// Which server contract the dashboard speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// `/status/{secret}` with the full session schema, polled every 500 ms.
    #[default]
    Primary,
    /// `/status` without a secret and with the reduced schema, polled every second.
    Simplified,
}

impl Variant {
    pub fn default_poll_interval(self) -> Duration {
        match self {
            Variant::Primary => Duration::from_millis(500),
            Variant::Simplified => Duration::from_millis(1000),
        }
    }

    pub const DEFAULT_TARGET: &'static str = "http://localhost:8080";
}

impl FromStr for Variant {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Variant::Primary),
            "simplified" => Ok(Variant::Simplified),
            other => Err(ClientError::InvalidEndpoint(format!(
                "unknown variant {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Primary => write!(f, "primary"),
            Variant::Simplified => write!(f, "simplified"),
        }
    }
}

/// `target` and `secret` as carried in a dashboard link's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub target: Option<String>,
    pub secret: Option<String>,
}

impl PageQuery {
    pub fn parse(link: &str) -> ClientResult<Self> {
        let url = Url::parse(link)
            .map_err(|err| ClientError::InvalidEndpoint(format!("{link}: {err}")))?;
        let mut query = PageQuery::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "target" => query.target = Some(value.into_owned()),
                "secret" => query.secret = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(query)
    }
}

/// Base URL plus shared secret of a race-control server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    target: Url,
    secret: Option<String>,
    variant: Variant,
}

impl Endpoint {
    pub fn new(target: &str, secret: Option<String>, variant: Variant) -> ClientResult<Self> {
        let target = Url::parse(target)
            .map_err(|err| ClientError::InvalidEndpoint(format!("{target}: {err}")))?;
        if target.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(format!(
                "{target} cannot carry a path"
            )));
        }
        if variant == Variant::Primary && secret.as_deref().map_or(true, str::is_empty) {
            return Err(ClientError::InvalidEndpoint(
                "the primary variant needs a secret".into(),
            ));
        }
        Ok(Self {
            target,
            secret,
            variant,
        })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn status_url(&self) -> ClientResult<Url> {
        self.url_with(&["status"])
    }

    /// Command URL; the driver is addressed by display name.
    pub fn penalty_url(&self, command: &PenaltyCommand) -> ClientResult<Url> {
        let code = command.action.code().to_string();
        self.url_with(&["penalty", command.driver_name.as_str(), code.as_str()])
    }

    /// Appends `segments` after the target path, inserting the secret after
    /// the first segment for the primary variant.
    fn url_with(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.target.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::InvalidEndpoint(format!("{} cannot carry a path", self.target))
            })?;
            path.pop_if_empty();
            for (idx, segment) in segments.iter().enumerate() {
                path.push(segment);
                if idx == 0 && self.variant == Variant::Primary {
                    if let Some(secret) = &self.secret {
                        path.push(secret);
                    }
                }
            }
        }
        Ok(url)
    }
}

/// reqwest client bound to one race-control endpoint.
#[derive(Debug, Clone)]
pub struct RaceControlClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl RaceControlClient {
    /// `timeout` of `None` lets a request hang for as long as the server does.
    pub fn new(endpoint: Endpoint, timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Fetches one snapshot in wire order.
    pub async fn fetch_status(&self) -> ClientResult<StatusSnapshot> {
        let url = self.endpoint.status_url()?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fires the command. Only the status line is checked; the body is never read.
    pub async fn send_penalty(&self, command: &PenaltyCommand) -> ClientResult<()> {
        let url = self.endpoint.penalty_url(command)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PenaltyAction;
    use std::net::SocketAddr;
    use warp::Filter;

    fn command(driver: &str, action: PenaltyAction) -> PenaltyCommand {
        PenaltyCommand {
            driver_name: driver.into(),
            action,
            reason: "test".into(),
        }
    }

    #[test]
    fn primary_urls_carry_the_secret() {
        let endpoint =
            Endpoint::new("http://race.local:8080", Some("s3cret".into()), Variant::Primary)
                .unwrap();
        assert_eq!(
            endpoint.status_url().unwrap().as_str(),
            "http://race.local:8080/status/s3cret"
        );
        assert_eq!(
            endpoint
                .penalty_url(&command("Ana", PenaltyAction::StopAndHold(10)))
                .unwrap()
                .as_str(),
            "http://race.local:8080/penalty/s3cret/Ana/4"
        );
    }

    #[test]
    fn simplified_urls_have_no_secret() {
        let endpoint = Endpoint::new("http://localhost:8080/", None, Variant::Simplified).unwrap();
        assert_eq!(
            endpoint.status_url().unwrap().as_str(),
            "http://localhost:8080/status"
        );
        assert_eq!(
            endpoint
                .penalty_url(&command("Ana", PenaltyAction::AddLaps(2)))
                .unwrap()
                .as_str(),
            "http://localhost:8080/penalty/Ana/21"
        );
    }

    #[test]
    fn driver_names_are_percent_encoded() {
        let endpoint =
            Endpoint::new("http://race.local/api", Some("abc".into()), Variant::Primary).unwrap();
        assert_eq!(
            endpoint
                .penalty_url(&command("Max Power/2", PenaltyAction::DriveThrough))
                .unwrap()
                .as_str(),
            "http://race.local/api/penalty/abc/Max%20Power%2F2/1"
        );
    }

    #[test]
    fn primary_variant_rejects_missing_secret() {
        assert!(Endpoint::new("http://race.local", None, Variant::Primary).is_err());
        assert!(Endpoint::new("http://race.local", Some(String::new()), Variant::Primary).is_err());
        assert!(Endpoint::new("not a url", Some("x".into()), Variant::Primary).is_err());
    }

    #[test]
    fn page_query_reads_target_and_secret() {
        let query =
            PageQuery::parse("http://dash.local/?target=http%3A%2F%2Frace.local%3A8080&secret=abc")
                .unwrap();
        assert_eq!(query.target.as_deref(), Some("http://race.local:8080"));
        assert_eq!(query.secret.as_deref(), Some("abc"));
        assert_eq!(
            PageQuery::parse("http://dash.local/").unwrap(),
            PageQuery::default()
        );
    }

    #[test]
    fn variant_parses_case_insensitively() {
        assert_eq!("Simplified".parse::<Variant>().unwrap(), Variant::Simplified);
        assert!("legacy".parse::<Variant>().is_err());
    }

    fn client_for(addr: SocketAddr) -> RaceControlClient {
        let endpoint =
            Endpoint::new(&format!("http://{addr}"), Some("abc".into()), Variant::Primary).unwrap();
        RaceControlClient::new(endpoint, Some(Duration::from_secs(5))).unwrap()
    }

    #[tokio::test]
    async fn fetch_status_decodes_snapshot() {
        let routes = warp::path!("status" / String).map(|secret: String| {
            warp::reply::json(&serde_json::json!({
                "build": 7,
                "name": secret,
                "track": "Monza",
                "session": "RACE",
                "maxLaps": 10,
                "vehicles": [
                    {"position": 2, "driverName": "B"},
                    {"position": 1, "driverName": "A"}
                ]
            }))
        });
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let client = client_for(addr);
        let snapshot = client.fetch_status().await.unwrap();
        assert_eq!(snapshot.name, "abc");
        assert_eq!(snapshot.vehicles.len(), 2);
    }

    #[tokio::test]
    async fn fetch_status_reports_malformed_body() {
        let routes = warp::path!("status" / String).map(|_: String| "not json");
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let client = client_for(addr);
        assert!(matches!(
            client.fetch_status().await,
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn send_penalty_hits_command_path() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let routes = warp::path!("penalty" / String / String / u8).map(
            move |secret: String, driver: String, code: u8| {
                let _ = tx.send((secret, driver, code));
                warp::reply()
            },
        );
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let client = client_for(addr);
        client
            .send_penalty(&command("Ana", PenaltyAction::Disqualify))
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some((String::from("abc"), String::from("Ana"), 2)));
    }

    #[tokio::test]
    async fn send_penalty_reports_rejection() {
        let routes = warp::path!("penalty" / String / String / u8).map(|_: String, _: String, _: u8| {
            warp::reply::with_status("nope", warp::http::StatusCode::FORBIDDEN)
        });
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let client = client_for(addr);
        assert!(matches!(
            client
                .send_penalty(&command("Ana", PenaltyAction::GetBack))
                .await,
            Err(ClientError::HttpStatus(status)) if status.as_u16() == 403
        ));
    }
}
