//! Handler storing records as documents in a CouchDB database.

use logweave_types::{
    handler_options, Binding, BoundArgs, Handler, HandlerDescriptor, HandlerOptions, LogweaveError,
    Record, Result,
};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::time::Duration;

/// Registry entry for `CouchDbHandler`.
///
/// The handler reads its connection options from the whole component spec.
pub const DESCRIPTOR: HandlerDescriptor = HandlerDescriptor {
    class: "CouchDbHandler",
    binding: Binding::WholeSpec,
    default_bubble: true,
    construct: CouchDbHandler::construct,
};

/// Connection options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CouchDbOptions {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name
    #[serde(default = "default_dbname")]
    pub dbname: String,
    /// Basic auth user
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5984
}

fn default_dbname() -> String {
    "logger".to_string()
}

/// Posts each record as a JSON document.
#[derive(Debug)]
pub struct CouchDbHandler {
    options: HandlerOptions,
    couch: CouchDbOptions,
    client: OnceCell<reqwest::blocking::Client>,
}

impl CouchDbHandler {
    /// Create a handler for a database.
    pub fn new(couch: CouchDbOptions) -> Self {
        Self {
            options: HandlerOptions::default(),
            couch,
            client: OnceCell::new(),
        }
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Handler>> {
        let spec = args.take_raw("spec").unwrap_or_default();
        let couch: CouchDbOptions = serde_json::from_value(spec).map_err(|e| {
            LogweaveError::InvalidParameter {
                parameter: "spec".to_string(),
                target: args.target().to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Box::new(Self::new(couch)))
    }

    /// Connection options.
    pub fn couch_options(&self) -> &CouchDbOptions {
        &self.couch
    }

    /// Database URL records are posted to.
    pub fn database_url(&self) -> String {
        format!("http://{}:{}/{}", self.couch.host, self.couch.port, self.couch.dbname)
    }

    fn client(&self) -> Result<&reqwest::blocking::Client> {
        self.client.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .map_err(|e| LogweaveError::Sink(format!("Failed to create CouchDB client: {}", e)))
        })
    }
}

impl Handler for CouchDbHandler {
    handler_options!();

    fn handle(&self, record: &Record) -> Result<bool> {
        let mut request = self.client()?.post(self.database_url()).json(record);
        if let Some(username) = &self.couch.username {
            request = request.basic_auth(username, self.couch.password.as_deref());
        }

        let response = request
            .send()
            .map_err(|e| LogweaveError::Sink(format!("CouchDB request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(LogweaveError::Sink(format!(
                "CouchDB rejected record with status {}",
                response.status()
            )));
        }

        Ok(!self.options.bubble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logweave_types::BoundValue;
    use serde_json::json;

    #[test]
    fn test_options_from_whole_spec() {
        let mut args = BoundArgs::new("CouchDbHandler");
        args.insert(
            "spec",
            BoundValue::Value(json!({"type": "couch_db", "host": "db.internal", "dbname": "audit"})),
        );

        let handler = CouchDbHandler::construct(args).unwrap();
        let handler = handler.as_any().downcast_ref::<CouchDbHandler>().unwrap();
        assert_eq!(handler.couch_options().port, 5984);
        assert_eq!(handler.database_url(), "http://db.internal:5984/audit");
    }

    #[test]
    fn test_invalid_port() {
        let mut args = BoundArgs::new("CouchDbHandler");
        args.insert("spec", BoundValue::Value(json!({"port": "not-a-port"})));
        assert!(CouchDbHandler::construct(args).is_err());
    }
}
