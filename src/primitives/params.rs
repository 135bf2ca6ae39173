//! BEP 41 extension parameters.
//!
//! Clients can append URL-data options to a UDP announce; the payload is
//! a relative URL such as `/announce?jwt=…`. The query part is decoded
//! into key/value pairs and carried, opaque to the frontend, for hooks
//! to consume.
use percent_encoding::percent_decode_str;

/// Parsed key/value parameters from a BEP 41 URL-data option.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Parses the query part of a relative URL-data payload.
    ///
    /// Everything up to the first `?` is the path and is ignored; the
    /// rest is split on `&` into percent-decoded `key=value` pairs.
    /// Pairs that do not decode as UTF-8 are dropped.
    #[must_use]
    pub fn from_url_data(url_data: &str) -> Self {
        let query = match url_data.split_once('?') {
            Some((_path, query)) => query,
            None => return Self::default(),
        };

        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                let key = percent_decode_str(key).decode_utf8().ok()?;
                let value = percent_decode_str(value).decode_utf8().ok()?;
                Some((key.into_owned(), value.into_owned()))
            })
            .collect();

        Self { pairs }
    }

    /// Looks a parameter up by key. Duplicate keys keep the first
    /// occurrence.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
