use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::error::{AllocationError, Result};
use super::{DirectoryGuest, GuestDirectory, TableUpdate};

/// Guest directory behind a PostgREST-style HTTP API
pub struct RestDirectory {
    client: Client,
    config: DirectoryConfig,
}

impl RestDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), self.config.table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }
}

#[async_trait]
impl GuestDirectory for RestDirectory {
    async fn list_guests(&self) -> Result<Vec<DirectoryGuest>> {
        let request = self
            .client
            .get(self.endpoint())
            .query(&[("select", "id,full_name_norm")]);

        let guests = self
            .authorize(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<DirectoryGuest>>()
            .await?;

        Ok(guests)
    }

    /// Upserts the whole batch in one request so it commits or fails as a unit
    async fn update_tables(&self, batch: &[TableUpdate]) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint())
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(batch);

        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AllocationError::BatchWrite {
                batch: 0,
                reason: format!("{} while seating {} guests: {}", status, batch.len(), body),
            });
        }

        debug!("Seated {} guests", batch.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory(url: &str) -> RestDirectory {
        RestDirectory::new(DirectoryConfig {
            url: url.to_string(),
            api_key: "key".into(),
            table: "guests".into(),
        })
    }

    fn update(id: &str, table: &str) -> TableUpdate {
        TableUpdate {
            id: id.to_string(),
            table_label: table.to_string(),
        }
    }

    #[test]
    fn endpoint_joins_url_and_table() {
        assert_eq!(
            directory("https://guests.example.org/").endpoint(),
            "https://guests.example.org/rest/v1/guests"
        );
    }

    #[tokio::test]
    async fn lists_guests_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/guests"))
            .and(query_param("select", "id,full_name_norm"))
            .and(header("apikey", "key"))
            .and(header("authorization", "Bearer key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "7", "full_name_norm": "tom hart" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let guests = directory(&server.uri()).list_guests().await.unwrap();

        assert_eq!(
            guests,
            vec![DirectoryGuest {
                id: "7".into(),
                full_name_norm: "tom hart".into(),
            }]
        );
    }

    #[tokio::test]
    async fn batch_spanning_tables_is_one_upsert() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/guests"))
            .and(query_param("on_conflict", "id"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let batch = vec![update("1", "Table 1"), update("2", "Table 2"), update("3", "Table 1")];
        directory(&server.uri()).update_tables(&batch).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let prefer = requests[0].headers.get("prefer").unwrap().to_str().unwrap();
        assert_eq!(prefer, "resolution=merge-duplicates,return=minimal");
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body,
            json!([
                { "id": "1", "table_label": "Table 1" },
                { "id": "2", "table_label": "Table 2" },
                { "id": "3", "table_label": "Table 1" }
            ])
        );
    }

    #[tokio::test]
    async fn rejected_batch_is_a_write_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("payload rejected"))
            .mount(&server)
            .await;

        let batch = vec![update("1", "Table 1"), update("2", "Table 2")];
        let err = directory(&server.uri()).update_tables(&batch).await.unwrap_err();

        match err {
            AllocationError::BatchWrite { reason, .. } => {
                assert!(reason.contains("500"), "{reason}");
                assert!(reason.contains("payload rejected"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
