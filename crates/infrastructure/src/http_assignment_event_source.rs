use std::time::Duration;

use accessmgmt_application::{
    AssignmentEvent, AssignmentEventKind, AssignmentEventPage, AssignmentEventSource,
};
use accessmgmt_core::{AppError, AppResult};
use accessmgmt_domain::{Assignment, EntityId, RoleId};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

/// Settings of the registry role-delegation feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryFeedConfig {
    /// Registry base URL, e.g. `https://registry.example/`.
    pub base_url: String,
    /// Requested page size of the first page.
    pub page_size: u32,
    /// Actor recorded for events that carry no performer.
    pub fallback_actor: Uuid,
    /// Attempts per page before the fetch fails.
    pub max_attempts: u8,
    /// Linear backoff between attempts.
    pub retry_backoff_ms: u64,
}

/// Reads the registry role-delegation feed over HTTP.
///
/// The cursor is the URL of the next page as published by the feed. When the feed has no next
/// page, the cursor stays on the page just read so the next poll re-reads it.
pub struct HttpAssignmentEventSource {
    http_client: reqwest::Client,
    config: RegistryFeedConfig,
}

impl HttpAssignmentEventSource {
    /// Creates a new feed reader.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: RegistryFeedConfig) -> Self {
        Self {
            http_client,
            config: RegistryFeedConfig {
                max_attempts: config.max_attempts.max(1),
                retry_backoff_ms: config.retry_backoff_ms.max(50),
                ..config
            },
        }
    }

    fn first_page_url(&self) -> String {
        format!(
            "{}/roledelegationevents/stream?pageSize={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.page_size.max(1)
        )
    }

    async fn fetch_with_retry(&self, url: &str) -> AppResult<FeedPage> {
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.config.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self.http_client.get(url).send().await;

            match response {
                Ok(response) if response.status().is_success() => {
                    return response.json::<FeedPage>().await.map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode registry feed page '{url}': {error}"
                        ))
                    });
                }
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} for registry feed page '{url}'",
                        response.status()
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Internal(format!(
                        "registry feed request failed with status {status}: {body}"
                    )));
                }
                Err(error) => {
                    last_error = Some(format!("registry feed transport error: {error}"));
                }
            }

            if attempt < self.config.max_attempts {
                let delay = self.config.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Unavailable(last_error.unwrap_or_else(|| {
            "registry feed exhausted retries".to_owned()
        })))
    }
}

#[async_trait]
impl AssignmentEventSource for HttpAssignmentEventSource {
    async fn fetch_page(&self, cursor: Option<&str>) -> AppResult<AssignmentEventPage> {
        let url = match cursor {
            Some(cursor) if !cursor.is_empty() => cursor.to_owned(),
            _ => self.first_page_url(),
        };

        let page = self.fetch_with_retry(url.as_str()).await?;
        debug!(url = %url, items = page.data.len(), "registry feed page fetched");
        Ok(page.into_event_page(url, self.config.fallback_actor))
    }
}

/// Change kinds published by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum DelegationAction {
    NotSet,
    Delegate,
    Revoke,
    DelegationSchemeCascadingDelete,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedItem {
    delegation_action: DelegationAction,
    from_party_uuid: Uuid,
    to_party_uuid: Uuid,
    role_id: Uuid,
    #[serde(default)]
    performed_by_party_uuid: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedLinks {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(default)]
    links: FeedLinks,
    #[serde(default)]
    data: Vec<FeedItem>,
}

impl FeedPage {
    fn into_event_page(self, current_url: String, fallback_actor: Uuid) -> AssignmentEventPage {
        let events = self
            .data
            .into_iter()
            .filter_map(|item| {
                let kind = match item.delegation_action {
                    DelegationAction::Delegate => AssignmentEventKind::Upsert,
                    DelegationAction::Revoke
                    | DelegationAction::DelegationSchemeCascadingDelete => {
                        AssignmentEventKind::Remove
                    }
                    DelegationAction::NotSet => return None,
                };
                Some(AssignmentEvent {
                    kind,
                    assignment: Assignment::new(
                        EntityId::from_uuid(item.from_party_uuid),
                        EntityId::from_uuid(item.to_party_uuid),
                        RoleId::from_uuid(item.role_id),
                    ),
                    performed_by: item.performed_by_party_uuid.unwrap_or(fallback_actor),
                })
            })
            .collect();

        match self.links.next.filter(|next| !next.is_empty()) {
            Some(next) => AssignmentEventPage {
                events,
                next_cursor: next,
                has_more: true,
            },
            None => AssignmentEventPage {
                events,
                next_cursor: current_url,
                has_more: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use accessmgmt_application::AssignmentEventKind;
    use uuid::Uuid;

    use super::{FeedPage, HttpAssignmentEventSource, RegistryFeedConfig};

    fn config() -> RegistryFeedConfig {
        RegistryFeedConfig {
            base_url: "https://registry.example/".to_owned(),
            page_size: 0,
            fallback_actor: Uuid::nil(),
            max_attempts: 0,
            retry_backoff_ms: 0,
        }
    }

    #[test]
    fn first_page_url_normalizes_base_and_page_size() {
        let source = HttpAssignmentEventSource::new(reqwest::Client::new(), config());

        assert_eq!(
            source.first_page_url(),
            "https://registry.example/roledelegationevents/stream?pageSize=1"
        );
        assert_eq!(source.config.max_attempts, 1);
        assert_eq!(source.config.retry_backoff_ms, 50);
    }

    #[test]
    fn feed_page_maps_actions_and_skips_unset_items() {
        let performer = Uuid::new_v4();
        let body = serde_json::json!({
            "links": { "next": "https://registry.example/next?token=2" },
            "data": [
                {
                    "delegationAction": "delegate",
                    "fromPartyUuid": Uuid::new_v4(),
                    "toPartyUuid": Uuid::new_v4(),
                    "roleId": Uuid::new_v4(),
                    "performedByPartyUuid": performer
                },
                {
                    "delegationAction": "notSet",
                    "fromPartyUuid": Uuid::new_v4(),
                    "toPartyUuid": Uuid::new_v4(),
                    "roleId": Uuid::new_v4()
                },
                {
                    "delegationAction": "delegationSchemeCascadingDelete",
                    "fromPartyUuid": Uuid::new_v4(),
                    "toPartyUuid": Uuid::new_v4(),
                    "roleId": Uuid::new_v4()
                }
            ]
        });

        let Ok(page) = serde_json::from_value::<FeedPage>(body) else {
            panic!("feed page should decode");
        };
        let page = page.into_event_page("https://registry.example/current".to_owned(), Uuid::nil());

        assert!(page.has_more);
        assert_eq!(page.next_cursor, "https://registry.example/next?token=2");
        assert_eq!(page.events.len(), 2);
        assert_eq!(page.events[0].kind, AssignmentEventKind::Upsert);
        assert_eq!(page.events[0].performed_by, performer);
        assert_eq!(page.events[1].kind, AssignmentEventKind::Remove);
        assert_eq!(page.events[1].performed_by, Uuid::nil());
    }

    #[test]
    fn last_page_keeps_cursor_on_current_url() {
        let Ok(page) = serde_json::from_value::<FeedPage>(serde_json::json!({ "data": [] }))
        else {
            panic!("feed page should decode");
        };

        let page = page.into_event_page("https://registry.example/current".to_owned(), Uuid::nil());

        assert!(!page.has_more);
        assert!(page.events.is_empty());
        assert_eq!(page.next_cursor, "https://registry.example/current");
    }
}
