//! Realtime messaging over a Socket.IO connection.

use super::message::Message;
use super::{ErrorKind, Result};
use serde_json::Value;
use std::sync::mpsc::{channel, Receiver};

pub const DEFAULT_RTM_URL: &str = "https://rtm.yellowant.com/";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RtmEvent {
    Connect,
    Disconnect,
    Error,
    YellowantCommand,
    YellowantMessage,
    YellowantWebhookSubscription,
}

impl RtmEvent {
    pub fn name(self) -> &'static str {
        match self {
            RtmEvent::Connect => "connect",
            RtmEvent::Disconnect => "disconnect",
            RtmEvent::Error => "error",
            RtmEvent::YellowantCommand => "yellowant_command",
            RtmEvent::YellowantMessage => "yellowant_message",
            RtmEvent::YellowantWebhookSubscription => "yellowant_webhook_subscription",
        }
    }
}

pub type EventHandler = Box<dyn FnMut(Value) + Send>;

/// A socket connection that dispatches named events to handlers.
pub trait SocketTransport {
    /// Handlers are registered before `open`.
    fn on(&mut self, event: RtmEvent, handler: EventHandler);
    fn open(&mut self) -> Result<()>;
    fn emit(&mut self, event: RtmEvent, payload: Value) -> Result<()>;
    /// Blocks until the connection closes.
    fn wait(&mut self) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
}

pub struct RtmClient<T = SocketIoTransport> {
    transport: T,
}

impl RtmClient {
    pub fn new(rtm_token: &str, client_id: &str) -> Result<RtmClient> {
        RtmClient::with_host(DEFAULT_RTM_URL, rtm_token, client_id)
    }

    pub fn with_host(host: &str, rtm_token: &str, client_id: &str) -> Result<RtmClient> {
        Ok(RtmClient::with_transport(SocketIoTransport::new(
            host, rtm_token, client_id,
        )?))
    }
}

impl<T: SocketTransport> RtmClient<T> {
    pub fn with_transport(transport: T) -> RtmClient<T> {
        RtmClient { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn bind_connect_event_handler<F>(&mut self, handler: F)
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.transport.on(RtmEvent::Connect, Box::new(handler));
    }

    pub fn bind_disconnect_event_handler<F>(&mut self, handler: F)
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.transport.on(RtmEvent::Disconnect, Box::new(handler));
    }

    pub fn bind_error_event_handler<F>(&mut self, handler: F)
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.transport.on(RtmEvent::Error, Box::new(handler));
    }

    pub fn bind_yellowant_webhook_subscription_event_handler<F>(&mut self, handler: F)
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.transport
            .on(RtmEvent::YellowantWebhookSubscription, Box::new(handler));
    }

    /// The handler receives `(event_id, request_data)`; absent keys are `Null`.
    pub fn bind_yellowant_command_event_handler<F>(&mut self, mut handler: F)
    where
        F: FnMut(Value, Value) + Send + 'static,
    {
        self.transport.on(
            RtmEvent::YellowantCommand,
            Box::new(move |mut data: Value| {
                let event_id = data.get_mut("event_id").map(Value::take).unwrap_or(Value::Null);
                let request_data = data
                    .get_mut("request_data")
                    .map(Value::take)
                    .unwrap_or(Value::Null);
                handler(event_id, request_data)
            }),
        );
    }

    /// Replies to a command with `{event_id, message}`.
    pub fn emit_yellowant_message<I: Into<Value>>(&mut self, event_id: I, message: &Message) -> Result<()> {
        let payload = json!({
            "event_id": event_id.into(),
            "message": message.to_value()?,
        });
        self.transport.emit(RtmEvent::YellowantMessage, payload)
    }

    pub fn connect(&mut self) -> Result<()> {
        self.transport.open()
    }

    pub fn wait(&mut self) -> Result<()> {
        self.transport.wait()
    }

    pub fn disconnect(&mut self) -> Result<()> {
        self.transport.disconnect()
    }
}

/// `SocketTransport` backed by `rust_socketio`'s blocking client.
pub struct SocketIoTransport {
    url: String,
    handlers: Vec<(RtmEvent, EventHandler)>,
    client: Option<rust_socketio::client::Client>,
    closed: Option<Receiver<()>>,
}

impl SocketIoTransport {
    pub fn new(host: &str, rtm_token: &str, client_id: &str) -> Result<SocketIoTransport> {
        let url = reqwest::Url::parse_with_params(
            host,
            &[("rtm_token", rtm_token), ("client_id", client_id)],
        )
        .map_err(|e| ErrorKind::InvalidValue("host", e.to_string()))?;
        Ok(SocketIoTransport {
            url: url.to_string(),
            handlers: vec![],
            client: None,
            closed: None,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn socket_event(event: RtmEvent) -> rust_socketio::Event {
    use rust_socketio::Event;
    match event {
        RtmEvent::Connect => Event::Connect,
        RtmEvent::Disconnect => Event::Close,
        RtmEvent::Error => Event::Error,
        other => Event::Custom(other.name().to_owned()),
    }
}

fn payload_value(payload: rust_socketio::Payload) -> Value {
    use rust_socketio::Payload;
    match payload {
        Payload::Text(mut values) => match values.len() {
            0 => Value::Null,
            1 => values.remove(0),
            _ => Value::Array(values),
        },
        _ => {
            warn!("dropping binary realtime payload");
            Value::Null
        }
    }
}

impl SocketTransport for SocketIoTransport {
    fn on(&mut self, event: RtmEvent, handler: EventHandler) {
        self.handlers.push((event, handler));
    }

    fn open(&mut self) -> Result<()> {
        use rust_socketio::{ClientBuilder, Payload, RawClient};

        let (tx, rx) = channel();
        let mut builder = ClientBuilder::new(self.url.as_str());
        let mut watches_close = false;
        for (event, mut handler) in self.handlers.drain(..) {
            if event == RtmEvent::Disconnect {
                watches_close = true;
                let tx = tx.clone();
                builder = builder.on(socket_event(event), move |payload: Payload, _: RawClient| {
                    handler(payload_value(payload));
                    let _ = tx.send(());
                });
            } else {
                builder = builder.on(socket_event(event), move |payload: Payload, _: RawClient| {
                    handler(payload_value(payload))
                });
            }
        }
        if !watches_close {
            builder = builder.on(rust_socketio::Event::Close, move |_: Payload, _: RawClient| {
                let _ = tx.send(());
            });
        }

        debug!("connecting to realtime server");
        self.client = Some(builder.connect()?);
        self.closed = Some(rx);
        Ok(())
    }

    fn emit(&mut self, event: RtmEvent, payload: Value) -> Result<()> {
        match self.client {
            Some(ref client) => Ok(client.emit(socket_event(event), rust_socketio::Payload::Text(vec![payload]))?),
            None => bail!(ErrorKind::NotConnected),
        }
    }

    fn wait(&mut self) -> Result<()> {
        match self.closed {
            // A dropped sender means the socket thread is gone as well.
            Some(ref closed) => {
                let _ = closed.recv();
                Ok(())
            }
            None => bail!(ErrorKind::NotConnected),
        }
    }

    fn disconnect(&mut self) -> Result<()> {
        match self.client.take() {
            Some(client) => {
                client.disconnect()?;
                self.closed = None;
                Ok(())
            }
            None => bail!(ErrorKind::NotConnected),
        }
    }
}
