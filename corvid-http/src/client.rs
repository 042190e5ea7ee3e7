use crate::{
    api_error::ApiError,
    error::{Error, ErrorType, Result},
    routing::Route,
};
use corvid_http_ratelimiting::{InMemoryRatelimiter, Ratelimiter};
use hyper::{
    body, client::HttpConnector, header::HeaderValue, Body, Request as HyperRequest, StatusCode,
};
use hyper_tls::HttpsConnector;
use serde::de::DeserializeOwned;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};

const API_VERSION: u8 = 10;

struct State {
    http: hyper::Client<HttpsConnector<HttpConnector>, Body>,
    ratelimiter: InMemoryRatelimiter,
    token: Option<Box<str>>,
    token_invalid: AtomicBool,
    proxy: Option<Box<str>>,
}

/// A REST client for the platform's HTTP API.
///
/// Cheap to clone: internal state is reference-counted.
#[derive(Clone)]
pub struct Client {
    state: Arc<State>,
}

impl Client {
    /// Create a client authenticated with a bot token.
    ///
    /// The token should already carry its `Bot ` or `Bearer ` prefix; the
    /// client does not add one.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        let https = HttpsConnector::new();

        Self {
            state: Arc::new(State {
                http: hyper::Client::builder().build(https),
                ratelimiter: InMemoryRatelimiter::new(),
                token: Some(token.into().into_boxed_str()),
                token_invalid: AtomicBool::new(false),
                proxy: None,
            }),
        }
    }

    /// Override the API host, routing requests through a proxy.
    #[must_use]
    pub fn with_proxy(token: impl Into<String>, proxy: impl Into<String>) -> Self {
        let https = HttpsConnector::new();

        Self {
            state: Arc::new(State {
                http: hyper::Client::builder().build(https),
                ratelimiter: InMemoryRatelimiter::new(),
                token: Some(token.into().into_boxed_str()),
                token_invalid: AtomicBool::new(false),
                proxy: Some(proxy.into().into_boxed_str()),
            }),
        }
    }

    /// Fetch gateway connection info, including the recommended shard count.
    #[must_use]
    pub fn gateway_bot(&self) -> request::GetGatewayBot<'_> {
        request::GetGatewayBot::new(self)
    }

    /// Fetch a guild by ID.
    #[must_use]
    pub fn guild(&self, guild_id: u64) -> request::GetGuild<'_> {
        request::GetGuild::new(self, guild_id)
    }

    /// Fetch a guild member by guild and user ID.
    #[must_use]
    pub fn guild_member(&self, guild_id: u64, user_id: u64) -> request::GetMember<'_> {
        request::GetMember::new(self, guild_id, user_id)
    }

    /// Create a message in a channel.
    #[must_use]
    pub fn create_message(&self, channel_id: u64) -> request::CreateMessage<'_> {
        request::CreateMessage::new(self, channel_id)
    }

    /// Execute a built request, deserializing the JSON response body into
    /// `T`.
    pub(crate) async fn request<T: DeserializeOwned>(&self, request: BuiltRequest) -> Result<T> {
        let bytes = self.request_bytes(request).await?;

        serde_json::from_slice(&bytes).map_err(|source| {
            Error::new(ErrorType::Parsing { body: bytes }, Some(Box::new(source)))
        })
    }

    async fn request_bytes(&self, request: BuiltRequest) -> Result<Vec<u8>> {
        let resp = self.make_request(request).await?;

        let bytes = body::to_bytes(resp.into_body())
            .await
            .map_err(Error::request)?;

        Ok(bytes.to_vec())
    }

    async fn make_request(
        &self,
        request: BuiltRequest,
    ) -> Result<hyper::Response<Body>> {
        let resp = self.raw(request).await?;
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        let bytes = body::to_bytes(resp.into_body())
            .await
            .map_err(Error::request)?
            .to_vec();

        let error: ApiError = serde_json::from_slice(&bytes).map_err(|source| {
            Error::new(
                ErrorType::Parsing {
                    body: bytes.clone(),
                },
                Some(Box::new(source)),
            )
        })?;

        Err(Error::new(
            ErrorType::Response {
                body: bytes,
                error,
                status,
            },
            None,
        ))
    }

    async fn raw(&self, built: BuiltRequest) -> Result<hyper::Response<Body>> {
        if self.state.token_invalid.load(Ordering::Relaxed) {
            return Err(Error::new(ErrorType::Unauthorized, None));
        }

        let BuiltRequest { route, body } = built;

        let host = self.state.proxy.as_deref().unwrap_or("discord.com");
        let url = format!("https://{host}/api/v{API_VERSION}/{route}");

        tracing::debug!(url, "sending request");

        let mut builder = HyperRequest::builder().method(route.method()).uri(&url);

        if let Some(token) = &self.state.token {
            builder = builder.header(
                hyper::header::AUTHORIZATION,
                HeaderValue::from_str(token)
                    .map_err(|_| Error::new(ErrorType::BuildingRequest, None))?,
            );
        }

        builder = builder.header(
            hyper::header::USER_AGENT,
            HeaderValue::from_static(concat!(
                "DiscordBot (https://github.com/corvid-rs/corvid, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            )),
        );

        let hyper_body = if let Some(bytes) = body {
            builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let req = builder
            .body(hyper_body)
            .map_err(|_| Error::new(ErrorType::BuildingRequest, None))?;

        let ticket_sender = self
            .state
            .ratelimiter
            .wait_for_ticket(route.path())
            .await
            .map_err(Error::ratelimiting)?;

        let resp = self.state.http.request(req).await.map_err(Error::request)?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            self.state.token_invalid.store(true, Ordering::Relaxed);
        }

        let headers = corvid_http_ratelimiting::RatelimitHeaders::from_headers(
            resp.headers(),
            resp.status() == StatusCode::TOO_MANY_REQUESTS,
        )
        .ok();
        let _ = ticket_sender.headers(headers);

        Ok(resp)
    }
}

/// A request that has been fully assembled and is ready to be sent.
pub(crate) struct BuiltRequest {
    pub(crate) route: Route,
    pub(crate) body: Option<Vec<u8>>,
}

pub mod request {
    use super::{BuiltRequest, Client};
    use crate::{error::Result, routing::Route};
    use corvid_model::{
        channel::message::Message,
        gateway::GatewayInfo,
        guild::{Guild, Member},
    };
    use serde::Serialize;

    /// Fetch gateway connection info for the authenticated bot.
    pub struct GetGatewayBot<'a> {
        http: &'a Client,
    }

    impl<'a> GetGatewayBot<'a> {
        pub(crate) const fn new(http: &'a Client) -> Self {
            Self { http }
        }

        /// Send the request.
        pub async fn exec(self) -> Result<GatewayInfo> {
            let built = BuiltRequest {
                route: Route::GetGatewayBot,
                body: None,
            };

            self.http.request(built).await
        }
    }

    /// Fetch a guild.
    pub struct GetGuild<'a> {
        http: &'a Client,
        guild_id: u64,
    }

    impl<'a> GetGuild<'a> {
        pub(crate) const fn new(http: &'a Client, guild_id: u64) -> Self {
            Self { http, guild_id }
        }

        /// Send the request.
        pub async fn exec(self) -> Result<Guild> {
            let built = BuiltRequest {
                route: Route::GetGuild {
                    guild_id: self.guild_id,
                },
                body: None,
            };

            self.http.request(built).await
        }
    }

    /// Fetch a guild member.
    pub struct GetMember<'a> {
        http: &'a Client,
        guild_id: u64,
        user_id: u64,
    }

    impl<'a> GetMember<'a> {
        pub(crate) const fn new(http: &'a Client, guild_id: u64, user_id: u64) -> Self {
            Self {
                http,
                guild_id,
                user_id,
            }
        }

        /// Send the request.
        pub async fn exec(self) -> Result<Member> {
            let built = BuiltRequest {
                route: Route::GetMember {
                    guild_id: self.guild_id,
                    user_id: self.user_id,
                },
                body: None,
            };

            self.http.request(built).await
        }
    }

    #[derive(Serialize)]
    struct CreateMessageFields<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<&'a str>,
    }

    /// Create a message in a channel.
    pub struct CreateMessage<'a> {
        http: &'a Client,
        channel_id: u64,
        content: Option<&'a str>,
    }

    impl<'a> CreateMessage<'a> {
        pub(crate) const fn new(http: &'a Client, channel_id: u64) -> Self {
            Self {
                http,
                channel_id,
                content: None,
            }
        }

        /// Set the message content.
        #[must_use]
        pub const fn content(mut self, content: &'a str) -> Self {
            self.content = Some(content);

            self
        }

        /// Send the request.
        pub async fn exec(self) -> Result<Message> {
            let fields = CreateMessageFields {
                content: self.content,
            };

            let body = serde_json::to_vec(&fields).map_err(crate::error::Error::json)?;

            let built = BuiltRequest {
                route: Route::CreateMessage {
                    channel_id: self.channel_id,
                },
                body: Some(body),
            };

            self.http.request(built).await
        }
    }
}
