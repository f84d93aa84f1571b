use super::OutgoingMessage;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LoginMessage<'a> {
    user: &'a str,
    password: &'a str,
    long_life: bool,
}

impl LoginMessage<'_> {
    pub fn new<'a>(user: &'a str, password: &'a str) -> LoginMessage<'a> {
        LoginMessage {
            user,
            password,
            long_life: false,
        }
    }
}

impl OutgoingMessage for LoginMessage<'_> {
    fn command(&self) -> &str {
        "login"
    }
}

#[derive(Debug, Serialize)]
pub struct LoginTokenMessage<'a> {
    token: &'a str,
}

impl LoginTokenMessage<'_> {
    pub fn new(token: &str) -> LoginTokenMessage<'_> {
        LoginTokenMessage { token }
    }
}

impl OutgoingMessage for LoginTokenMessage<'_> {
    fn command(&self) -> &str {
        "login"
    }
}
