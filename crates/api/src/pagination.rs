use crate::error::Result;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::debug;
use url::form_urlencoded;

/// Paging links returned alongside offset-paged list responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// One page of an offset-paged listing (`/v2/users`, `/v2/alerts`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPage<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub took: f64,
    #[serde(default)]
    pub request_id: String,
}

impl<T> OffsetPage<T> {
    pub fn has_next(&self) -> bool {
        self.paging
            .as_ref()
            .and_then(|paging| paging.next.as_deref())
            .is_some_and(|next| !next.is_empty())
    }
}

/// One page of a cursor-paged listing. An empty `marker` means the listing
/// is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub marker: String,
    #[serde(default)]
    pub took: f64,
    #[serde(default)]
    pub request_id: String,
}

impl<T> CursorPage<T> {
    pub fn is_last(&self) -> bool {
        self.marker.is_empty()
    }
}

/// Common list parameters. Unset fields are left off the query string.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub query: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    pub fn append_to(&self, serializer: &mut form_urlencoded::Serializer<'_, String>) {
        if let Some(query) = self.query.as_deref() {
            serializer.append_pair("query", query);
        }
        if let Some(limit) = self.limit {
            serializer.append_pair("limit", &limit.to_string());
        }
        if let Some(offset) = self.offset {
            serializer.append_pair("offset", &offset.to_string());
        }
        if let Some(sort) = self.sort.as_deref() {
            serializer.append_pair("sort", sort);
        }
        if let Some(order) = self.order.as_deref() {
            serializer.append_pair("order", order);
        }
    }

    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        self.append_to(&mut serializer);
        serializer.finish()
    }
}

/// Joins a path and an already encoded query string.
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

#[async_trait]
pub trait Paginator<T>: Sync {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<OffsetPage<T>>;

    fn stream<'a>(&'a self, limit: u32) -> Pin<Box<dyn Stream<Item = Result<Vec<T>>> + Send + 'a>>
    where
        T: Send + 'a,
    {
        Box::pin(async_stream::stream! {
            let mut offset = 0;

            loop {
                debug!(offset, limit, "Fetching page in stream");
                match self.fetch_page(offset, limit).await {
                    Ok(page) => {
                        let item_count = page.data.len();
                        let has_next = page.has_next();

                        yield Ok(page.data);

                        if !has_next || item_count == 0 {
                            break;
                        }

                        offset += item_count as u32;
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}

pub async fn collect_pages<T, P: Paginator<T>>(
    paginator: &P,
    limit: u32,
    max_items: Option<usize>,
) -> Result<Vec<T>>
where
    T: Send,
{
    let mut stream = paginator.stream(limit);
    let mut all_items = Vec::new();

    while let Some(result) = stream.next().await {
        all_items.extend(result?);

        if let Some(max_items) = max_items {
            if all_items.len() >= max_items {
                all_items.truncate(max_items);
                break;
            }
        }
    }

    debug!(total_items = all_items.len(), "Finished pagination");
    Ok(all_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::Mutex;

    struct Numbers {
        total: u32,
        offsets: Mutex<Vec<u32>>,
        fail_at: Option<u32>,
    }

    #[async_trait]
    impl Paginator<u32> for Numbers {
        async fn fetch_page(&self, offset: u32, limit: u32) -> Result<OffsetPage<u32>> {
            self.offsets.lock().unwrap().push(offset);
            if self.fail_at == Some(offset) {
                return Err(ApiError::ServerError {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let end = (offset + limit).min(self.total);
            let next = (end < self.total).then(|| format!("/v2/users?offset={end}"));
            Ok(OffsetPage {
                data: (offset..end).collect(),
                paging: Some(Paging {
                    next,
                    ..Paging::default()
                }),
                total_count: Some(self.total as u64),
                took: 0.0,
                request_id: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn collects_every_page() {
        let source = Numbers {
            total: 7,
            offsets: Mutex::new(Vec::new()),
            fail_at: None,
        };
        let items = collect_pages(&source, 3, None).await.unwrap();
        assert_eq!(items, (0..7).collect::<Vec<_>>());
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 3, 6]);
    }

    #[tokio::test]
    async fn honours_max_items() {
        let source = Numbers {
            total: 10,
            offsets: Mutex::new(Vec::new()),
            fail_at: None,
        };
        let items = collect_pages(&source, 4, Some(5)).await.unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 4]);
    }

    #[tokio::test]
    async fn stops_on_first_error() {
        let source = Numbers {
            total: 10,
            offsets: Mutex::new(Vec::new()),
            fail_at: Some(2),
        };
        let result = collect_pages(&source, 2, None).await;
        assert!(result.is_err());
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 2]);
    }

    #[test]
    fn cursor_page_with_empty_marker_is_last() {
        let page: CursorPage<String> =
            serde_json::from_str(r#"{"data":[],"marker":"","took":0.1,"requestId":"r"}"#).unwrap();
        assert!(page.is_last());

        let page: CursorPage<String> = serde_json::from_str(r#"{"marker":"2024-03-10"}"#).unwrap();
        assert!(!page.is_last());
        assert!(page.data.is_empty());
    }

    #[test]
    fn list_params_skip_unset_fields() {
        assert_eq!(ListParams::default().to_query(), "");

        let params = ListParams {
            query: Some("status: open".to_string()),
            limit: Some(20),
            offset: None,
            sort: Some("createdAt".to_string()),
            order: None,
        };
        assert_eq!(
            params.to_query(),
            "query=status%3A+open&limit=20&sort=createdAt"
        );
    }

    #[test]
    fn with_query_omits_empty_query() {
        assert_eq!(with_query("/v2/teams", ""), "/v2/teams");
        assert_eq!(with_query("/v2/teams", "limit=1"), "/v2/teams?limit=1");
    }
}
