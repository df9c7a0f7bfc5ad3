//! Status codes returned by the YellowAnt API and their meaning.

use std::collections::HashMap;

lazy_static! {
    static ref STATUS_CODES: HashMap<u16, (&'static str, &'static str)> = {
        let mut m = HashMap::new();
        m.insert(200, ("OK", "Success!"));
        m.insert(204, ("OK", "Modified!"));
        m.insert(304, ("Not Modified", "There was no new data to return."));
        m.insert(
            400,
            (
                "Bad Request",
                "The request was invalid. An accompanying error message will explain why. \
                 This is the status code will be returned during rate limiting.",
            ),
        );
        m.insert(401, ("Unauthorized", "Authentication credentials were missing or incorrect."));
        m.insert(
            403,
            (
                "Forbidden",
                "The request is understood, but it has been refused. An accompanying error \
                 message will explain why. This code is used when requests are being denied \
                 due to update limits.",
            ),
        );
        m.insert(
            404,
            (
                "Not Found",
                "The URI requested is invalid or the resource requested, such as a user, \
                 does not exists.",
            ),
        );
        m.insert(
            405,
            (
                "Method not allowed",
                "The URI requested is invalid or the resource requested, such as a user, \
                 does not exists.",
            ),
        );
        m.insert(
            406,
            (
                "Not Acceptable",
                "Returned by the Search API when an invalid format is specified in the request.",
            ),
        );
        m.insert(
            410,
            (
                "Gone",
                "This resource is gone. Used to indicate that an API endpoint has been turned off.",
            ),
        );
        m.insert(
            422,
            (
                "Unprocessable Entity",
                "Returned when an image uploaded to POST account/update_profile_banner is \
                 unable to be processed.",
            ),
        );
        m.insert(
            429,
            (
                "Too Many Requests",
                "Returned when a request cannot be served due to the application's rate \
                 limit having been exhausted for the resource.",
            ),
        );
        m.insert(
            500,
            (
                "Internal Server Error",
                "Something is broken. Please post to the group so the YellowAnt team can \
                 investigate.",
            ),
        );
        m.insert(501, ("Not Implemented", "User is not subscribed to this webhook data"));
        m.insert(502, ("Bad Gateway", "YellowAnt is down or being upgraded."));
        m.insert(
            503,
            (
                "Service Unavailable",
                "The YellowAnt servers are up, but overloaded with requests. Try again later.",
            ),
        );
        m.insert(
            504,
            (
                "Gateway Timeout",
                "The YellowAnt servers are up, but the request couldn't be serviced due to \
                 some failure within our stack. Try again later.",
            ),
        );
        m
    };
}

/// Label and description for a documented status code.
pub fn lookup(code: u16) -> Option<(&'static str, &'static str)> {
    STATUS_CODES.get(&code).cloned()
}

/// Prefixes `msg` with the status code and its label when the code is documented.
pub fn describe(code: u16, msg: &str) -> String {
    match lookup(code) {
        Some((label, _)) => format!("YellowAnt API returned a {} ({}), {}", code, label, msg),
        None => msg.to_owned(),
    }
}
