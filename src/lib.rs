extern crate chrono;
extern crate clap;
extern crate config;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate reqwest;
extern crate rust_socketio;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate serde_yaml;
extern crate toml;

pub mod error;
pub use error::{Error, ErrorKind, Result, ResultExt};

pub mod status;

pub mod message;
pub use message::{Attachment, Button, Field, JsonFormat, LogEntry, Message, MessageError};

pub mod http;
pub use http::{FilePart, HttpSend, Method, Params};

pub mod client;
pub use client::{Client, ClientConfig, LastCall};

mod endpoints;

pub mod oauth;
pub use oauth::AccessToken;

pub mod rtm;
pub use rtm::{RtmClient, RtmEvent, SocketTransport};

pub mod store;
pub mod normalizer;
pub mod settings;
pub mod commands;

#[cfg(test)]
mod testing;
