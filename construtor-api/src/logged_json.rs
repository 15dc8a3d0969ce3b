//! JSON body guard that logs what the client sent.
//!
//! `LoggedJson<T>` parses exactly like `Json<T>` and then writes the
//! re-serialized body to the log. Use it for resource payloads only: bodies
//! carrying passwords go through plain `Json<T>`.

use rocket::data::{self, Data, FromData};
use rocket::request::Request;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

/// Bodies longer than this are cut in the log line.
const MAX_LOGGED_BYTES: usize = 2048;

pub struct LoggedJson<T>(pub T);

impl<T> LoggedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for LoggedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn truncate_for_log(body: &str) -> &str {
    if body.len() <= MAX_LOGGED_BYTES {
        return body;
    }
    let mut end = MAX_LOGGED_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[rocket::async_trait]
impl<'r, T: Deserialize<'r> + Serialize> FromData<'r> for LoggedJson<T> {
    type Error = rocket::serde::json::Error<'r>;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            data::Outcome::Success(parsed) => {
                match serde_json::to_string(&parsed.0) {
                    Ok(body) => info!(
                        "Request body: {} {} | {}",
                        req.method().as_str(),
                        req.uri().path(),
                        truncate_for_log(&body)
                    ),
                    Err(_) => info!(
                        "Request body: {} {} | <unserializable>",
                        req.method().as_str(),
                        req.uri().path()
                    ),
                }
                data::Outcome::Success(LoggedJson(parsed.into_inner()))
            }
            data::Outcome::Error(e) => {
                warn!(
                    "Rejected request body: {} {} | {:?}",
                    req.method().as_str(),
                    req.uri().path(),
                    e.1
                );
                data::Outcome::Error(e)
            }
            data::Outcome::Forward(f) => data::Outcome::Forward(f),
        }
    }
}
